#![forbid(unsafe_code)]

//! A simulated document with just enough layout for scroll coordination.
//!
//! The page is a vertical stack of blocks (one per section). A block may hold
//! fixed children, grids (rows of cards that grow the block as items are
//! added) and strips (a single horizontal row of cards). Every mutation
//! re-runs layout, so rects always describe the current DOM, exactly like
//! `getBoundingClientRect` would.

use std::collections::BTreeMap;

use folio_core::{ElementId, LayoutProbe, Rect, Viewport};

/// Load state of a simulated `<img>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone)]
struct Image {
    state: ImageState,
    /// Owner element followed by its containers, innermost first.
    ancestors: Vec<ElementId>,
}

#[derive(Debug, Clone)]
struct Block {
    id: ElementId,
    height: f64,
    /// Positions relative to the block's top.
    children: Vec<(ElementId, Rect)>,
}

/// Cards flowing in rows.
#[derive(Debug, Clone)]
struct Grid {
    id: ElementId,
    block: ElementId,
    offset: f64,
    columns: usize,
    cell: (f64, f64),
    gap: f64,
    items: Vec<ElementId>,
}

impl Grid {
    fn rows(&self) -> usize {
        self.items.len().div_ceil(self.columns.max(1))
    }

    fn height(&self) -> f64 {
        let rows = self.rows() as f64;
        if rows == 0.0 {
            0.0
        } else {
            rows * self.cell.1 + (rows - 1.0) * self.gap
        }
    }
}

/// A single row of cards scrolled horizontally.
#[derive(Debug, Clone)]
struct Strip {
    id: ElementId,
    block: ElementId,
    offset: f64,
    width: f64,
    card: (f64, f64),
    gap: f64,
    items: Vec<ElementId>,
    scroll_left: f64,
}

impl Strip {
    fn max_scroll(&self) -> f64 {
        let n = self.items.len() as f64;
        let content = if n == 0.0 {
            0.0
        } else {
            n * self.card.0 + (n - 1.0) * self.gap
        };
        (content - self.width).max(0.0)
    }
}

/// The simulated page.
#[derive(Debug, Clone)]
pub struct SimDocument {
    width: f64,
    height: f64,
    scroll_y: f64,
    blocks: Vec<Block>,
    grids: Vec<Grid>,
    strips: Vec<Strip>,
    images: BTreeMap<ElementId, Image>,
    fonts_api: bool,
    ready: bool,
    rects: BTreeMap<ElementId, Rect>,
    document_height: f64,
}

impl SimDocument {
    /// An empty page with a `width` x `height` viewport.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
            blocks: Vec::new(),
            grids: Vec::new(),
            strips: Vec::new(),
            images: BTreeMap::new(),
            fonts_api: true,
            ready: true,
            rects: BTreeMap::new(),
            document_height: 0.0,
        }
    }

    /// The portfolio page: home, about, projects (with an empty card grid)
    /// and contact, each with a title, in a 1280x800 viewport.
    #[must_use]
    pub fn portfolio() -> Self {
        let mut doc = Self::new(1280.0, 800.0);
        doc.push_block("home", 900.0);
        doc.push_block("about", 1400.0)
            .add_child("about", "about-title", Rect::new(100.0, 80.0, 600.0, 60.0))
            .add_child("about", "about-bio", Rect::new(100.0, 180.0, 600.0, 300.0));
        doc.push_block("projects", 400.0)
            .add_child("projects", "projects-title", Rect::new(100.0, 80.0, 600.0, 60.0))
            .add_grid("projects", "projects-grid", 200.0, 3, (360.0, 300.0), 20.0);
        doc.push_block("contact", 1000.0)
            .add_child("contact", "contact-title", Rect::new(100.0, 80.0, 600.0, 60.0))
            .add_child("contact", "contact-form", Rect::new(700.0, 200.0, 480.0, 500.0));
        doc
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append a block (section) at the bottom of the page.
    pub fn push_block(&mut self, id: &str, height: f64) -> &mut Self {
        self.blocks.push(Block {
            id: ElementId::new(id),
            height,
            children: Vec::new(),
        });
        self.relayout();
        self
    }

    /// Add a child positioned relative to its block's top.
    pub fn add_child(&mut self, block: &str, id: &str, rect: Rect) -> &mut Self {
        if let Some(b) = self.blocks.iter_mut().find(|b| b.id.as_str() == block) {
            b.children.push((ElementId::new(id), rect));
        }
        self.relayout();
        self
    }

    /// Add an empty grid `offset` px below the block top. The grid grows the
    /// block by its own height.
    pub fn add_grid(
        &mut self,
        block: &str,
        id: &str,
        offset: f64,
        columns: usize,
        cell: (f64, f64),
        gap: f64,
    ) -> &mut Self {
        self.grids.push(Grid {
            id: ElementId::new(id),
            block: ElementId::new(block),
            offset,
            columns,
            cell,
            gap,
            items: Vec::new(),
        });
        self.relayout();
        self
    }

    /// Add an empty horizontal strip `offset` px below the block top.
    pub fn add_strip(
        &mut self,
        block: &str,
        id: &str,
        offset: f64,
        card: (f64, f64),
        gap: f64,
    ) -> &mut Self {
        self.strips.push(Strip {
            id: ElementId::new(id),
            block: ElementId::new(block),
            offset,
            width: self.width,
            card,
            gap,
            items: Vec::new(),
            scroll_left: 0.0,
        });
        self.relayout();
        self
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append items to a grid. Returns the number of items now in it.
    pub fn append_to_grid(&mut self, grid: &str, items: &[ElementId]) -> usize {
        let Some(g) = self.grids.iter_mut().find(|g| g.id.as_str() == grid) else {
            return 0;
        };
        g.items.extend(items.iter().cloned());
        let count = g.items.len();
        self.relayout();
        count
    }

    /// Replace the cards in a strip.
    pub fn render_strip(&mut self, strip: &str, items: Vec<ElementId>) {
        if let Some(s) = self.strips.iter_mut().find(|s| s.id.as_str() == strip) {
            s.items = items;
            s.scroll_left = s.scroll_left.min(s.max_scroll());
        }
        self.relayout();
    }

    /// Set a strip's `scrollLeft`, clamped like a browser. Returns the value
    /// actually applied.
    pub fn set_scroll_left(&mut self, strip: &ElementId, x: f64) -> Option<f64> {
        let s = self.strips.iter_mut().find(|s| &s.id == strip)?;
        s.scroll_left = x.clamp(0.0, s.max_scroll());
        Some(s.scroll_left)
    }

    #[must_use]
    pub fn scroll_left(&self, strip: &ElementId) -> Option<f64> {
        self.strips.iter().find(|s| &s.id == strip).map(|s| s.scroll_left)
    }

    /// Change a block's own height (everything below moves).
    pub fn set_block_height(&mut self, block: &str, height: f64) {
        if let Some(b) = self.blocks.iter_mut().find(|b| b.id.as_str() == block) {
            b.height = height;
        }
        self.relayout();
    }

    /// Remove an element and anything laid out inside it.
    pub fn remove(&mut self, id: &str) {
        self.blocks.retain(|b| b.id.as_str() != id);
        for b in &mut self.blocks {
            b.children.retain(|(c, _)| c.as_str() != id);
        }
        self.grids.retain(|g| g.id.as_str() != id && g.block.as_str() != id);
        for g in &mut self.grids {
            g.items.retain(|i| i.as_str() != id);
        }
        self.strips.retain(|s| s.id.as_str() != id && s.block.as_str() != id);
        self.relayout();
    }

    /// Add an `<img>` inside `owner`.
    pub fn add_image(&mut self, id: &str, owner: &str, state: ImageState) {
        let owner = ElementId::new(owner);
        let mut ancestors = vec![owner.clone()];
        if let Some(g) = self.grids.iter().find(|g| g.items.contains(&owner)) {
            ancestors.push(g.id.clone());
            ancestors.push(g.block.clone());
        } else if let Some(s) = self.strips.iter().find(|s| s.items.contains(&owner)) {
            ancestors.push(s.id.clone());
            ancestors.push(s.block.clone());
        } else if let Some(b) = self
            .blocks
            .iter()
            .find(|b| b.children.iter().any(|(c, _)| *c == owner))
        {
            ancestors.push(b.id.clone());
        }
        self.images.insert(ElementId::new(id), Image { state, ancestors });
    }

    /// Finish loading an image. Returns `false` if it was not loading.
    pub fn settle_image(&mut self, id: &ElementId, state: ImageState) -> bool {
        match self.images.get_mut(id) {
            Some(img) if img.state == ImageState::Loading => {
                img.state = state;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn image_state(&self, id: &ElementId) -> Option<ImageState> {
        self.images.get(id).map(|i| i.state)
    }

    /// Scroll the window, clamped to the document. Returns the applied offset.
    pub fn scroll_to(&mut self, y: f64) -> f64 {
        self.scroll_y = self.viewport().clamp_scroll(y);
        self.scroll_y
    }

    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        for s in &mut self.strips {
            s.width = width;
        }
        self.relayout();
        self.scroll_y = self.viewport().clamp_scroll(self.scroll_y);
    }

    pub fn set_fonts_api(&mut self, available: bool) {
        self.fonts_api = available;
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Every laid-out element, in id order.
    pub fn elements(&self) -> impl Iterator<Item = (&ElementId, &Rect)> {
        self.rects.iter()
    }

    /// The block that contains `element` (a block contains itself).
    #[must_use]
    pub fn block_of(&self, element: &ElementId) -> Option<ElementId> {
        if self.blocks.iter().any(|b| &b.id == element) {
            return Some(element.clone());
        }
        self.blocks
            .iter()
            .find(|b| b.children.iter().any(|(c, _)| c == element))
            .map(|b| b.id.clone())
            .or_else(|| {
                self.grids
                    .iter()
                    .find(|g| &g.id == element || g.items.contains(element))
                    .map(|g| g.block.clone())
            })
            .or_else(|| {
                self.strips
                    .iter()
                    .find(|s| &s.id == element || s.items.contains(element))
                    .map(|s| s.block.clone())
            })
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    fn block_height(&self, block: &Block) -> f64 {
        let grids: f64 = self
            .grids
            .iter()
            .filter(|g| g.block == block.id)
            .map(Grid::height)
            .sum();
        block.height + grids
    }

    fn relayout(&mut self) {
        let mut rects = BTreeMap::new();
        let mut top = 0.0;
        for block in &self.blocks {
            let height = self.block_height(block);
            rects.insert(block.id.clone(), Rect::new(0.0, top, self.width, height));
            for (id, rel) in &block.children {
                rects.insert(id.clone(), rel.shifted(top));
            }
            for grid in self.grids.iter().filter(|g| g.block == block.id) {
                let grid_top = top + grid.offset;
                let cols = grid.columns.max(1);
                let grid_width = cols as f64 * grid.cell.0 + (cols as f64 - 1.0) * grid.gap;
                rects.insert(
                    grid.id.clone(),
                    Rect::new(0.0, grid_top, grid_width, grid.height()),
                );
                for (i, item) in grid.items.iter().enumerate() {
                    let (row, col) = (i / cols, i % cols);
                    rects.insert(
                        item.clone(),
                        Rect::new(
                            col as f64 * (grid.cell.0 + grid.gap),
                            grid_top + row as f64 * (grid.cell.1 + grid.gap),
                            grid.cell.0,
                            grid.cell.1,
                        ),
                    );
                }
            }
            for strip in self.strips.iter().filter(|s| s.block == block.id) {
                let strip_top = top + strip.offset;
                rects.insert(
                    strip.id.clone(),
                    Rect::new(0.0, strip_top, strip.width, strip.card.1),
                );
                for (i, item) in strip.items.iter().enumerate() {
                    rects.insert(
                        item.clone(),
                        Rect::new(
                            i as f64 * (strip.card.0 + strip.gap),
                            strip_top,
                            strip.card.0,
                            strip.card.1,
                        ),
                    );
                }
            }
            top += height;
        }
        self.rects = rects;
        self.document_height = top;
    }
}

impl LayoutProbe for SimDocument {
    fn rect(&self, element: &ElementId) -> Option<Rect> {
        self.rects.get(element).copied()
    }

    fn viewport(&self) -> Viewport {
        let mut viewport = Viewport::new(self.width, self.height, self.document_height);
        viewport.scroll_y = self.scroll_y;
        viewport
    }

    fn pending_images(&self, scope: Option<&ElementId>) -> Vec<ElementId> {
        self.images
            .iter()
            .filter(|(_, img)| img.state == ImageState::Loading)
            .filter(|(_, img)| scope.is_none_or(|s| img.ancestors.contains(s)))
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn fonts_api_available(&self) -> bool {
        self.fonts_api
    }

    fn document_ready(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_stacks_sections() {
        let doc = SimDocument::portfolio();
        let top = |id: &str| doc.rect(&ElementId::new(id)).map(|r| r.top);
        assert_eq!(top("home"), Some(0.0));
        assert_eq!(top("about"), Some(900.0));
        assert_eq!(top("projects"), Some(2300.0));
        assert_eq!(top("contact"), Some(2700.0));
        assert_eq!(top("contact-title"), Some(2780.0));
        assert_eq!(doc.viewport().document_height, 3700.0);
    }

    #[test]
    fn grid_growth_pushes_later_sections_down() {
        let mut doc = SimDocument::portfolio();
        let cards: Vec<_> = (0..4).map(|i| ElementId::new(format!("card-{i}"))).collect();
        assert_eq!(doc.append_to_grid("projects-grid", &cards), 4);
        // two rows: 2 * 300 + 20
        assert_eq!(doc.rect(&ElementId::new("contact")).map(|r| r.top), Some(2700.0 + 620.0));
        let last = doc.rect(&ElementId::new("card-3")).unwrap();
        assert_eq!((last.left, last.top), (0.0, 2300.0 + 200.0 + 320.0));
    }

    #[test]
    fn pending_images_respect_scope() {
        let mut doc = SimDocument::portfolio();
        doc.append_to_grid("projects-grid", &[ElementId::new("card-a")]);
        doc.add_image("img-a", "card-a", ImageState::Loading);
        doc.add_image("img-bio", "about-bio", ImageState::Loading);
        let grid = ElementId::new("projects-grid");
        assert_eq!(doc.pending_images(Some(&grid)), vec![ElementId::new("img-a")]);
        assert_eq!(doc.pending_images(None).len(), 2);
        assert!(doc.settle_image(&ElementId::new("img-a"), ImageState::Failed));
        assert!(doc.pending_images(Some(&grid)).is_empty());
    }

    #[test]
    fn scroll_is_clamped() {
        let mut doc = SimDocument::portfolio();
        assert_eq!(doc.scroll_to(-50.0), 0.0);
        assert_eq!(doc.scroll_to(10_000.0), 3700.0 - 800.0);
    }

    #[test]
    fn strip_scroll_left_clamps_to_content() {
        let mut doc = SimDocument::portfolio();
        doc.add_strip("projects", "strip", 150.0, (280.0, 380.0), 20.0);
        let cards = (0..6).map(|i| ElementId::new(format!("card-{i}"))).collect();
        doc.render_strip("strip", cards);
        let strip = ElementId::new("strip");
        // 6 * 280 + 5 * 20 - 1280
        assert_eq!(doc.set_scroll_left(&strip, 5000.0), Some(500.0));
        assert_eq!(doc.rect(&ElementId::new("card-1")).map(|r| r.width), Some(280.0));
    }
}
