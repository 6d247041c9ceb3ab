#![forbid(unsafe_code)]

//! Geometric primitives in document coordinates.
//!
//! All positions are CSS pixels measured from the top-left corner of the
//! document (not the viewport), so a trigger's geometry does not change when
//! the window scrolls, only when layout changes.
//!
//! # Invariants
//!
//! 1. [`Anchor::scroll_position`] is monotone in the element's edge: moving an
//!    element down never moves its trigger position up.
//! 2. [`Viewport::clamp_scroll`] always returns a value in `0..=max_scroll()`.

use std::fmt;
use std::str::FromStr;

/// Stable handle naming a DOM element (its `id` attribute).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    /// Create a handle for the element with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An element's bounding box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Vertical position of the given edge.
    #[inline]
    #[must_use]
    pub fn edge_y(&self, edge: Edge) -> f64 {
        self.top + edge.fraction() * self.height
    }

    /// Return a copy moved vertically by `dy`.
    #[must_use]
    pub fn shifted(self, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            ..self
        }
    }
}

/// Window scroll state and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Current vertical scroll offset (`window.scrollY`).
    pub scroll_y: f64,
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
    /// Total scrollable document height.
    pub document_height: f64,
}

impl Viewport {
    /// Create a viewport scrolled to the top.
    #[must_use]
    pub const fn new(width: f64, height: f64, document_height: f64) -> Self {
        Self {
            scroll_y: 0.0,
            width,
            height,
            document_height,
        }
    }

    /// Largest reachable scroll offset.
    #[inline]
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.document_height - self.height).max(0.0)
    }

    /// Clamp a desired scroll offset into the reachable range.
    #[inline]
    #[must_use]
    pub fn clamp_scroll(&self, y: f64) -> f64 {
        if y.is_nan() {
            return 0.0;
        }
        y.clamp(0.0, self.max_scroll())
    }
}

/// Which edge of an element (or of the viewport) an anchor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Center,
    Bottom,
}

impl Edge {
    /// Fractional position of the edge within its box.
    #[inline]
    #[must_use]
    pub const fn fraction(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "top" => Some(Self::Top),
            "center" => Some(Self::Center),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// A threshold: "this edge of the element meets this point of the viewport".
///
/// `"top 80%"` means the element's top edge crosses the line 80% of the way
/// down the viewport. Parsed from the same strings the site's markup uses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Anchor {
    /// Element edge.
    pub edge: Edge,
    /// Viewport point as a fraction of the viewport height.
    pub viewport: f64,
}

impl Anchor {
    /// Create an anchor. The viewport fraction is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn new(edge: Edge, viewport: f64) -> Self {
        let viewport = if viewport.is_finite() {
            viewport.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { edge, viewport }
    }

    /// Scroll offset at which this anchor is satisfied for `rect`.
    #[inline]
    #[must_use]
    pub fn scroll_position(&self, rect: &Rect, viewport_height: f64) -> f64 {
        rect.edge_y(self.edge) - self.viewport * viewport_height
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = (self.viewport * 10_000.0).round() / 100.0;
        write!(f, "{} {}%", self.edge.keyword(), pct)
    }
}

/// Error from parsing an [`Anchor`] string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorParseError {
    input: String,
    reason: &'static str,
}

impl AnchorParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

impl fmt::Display for AnchorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid anchor {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for AnchorParseError {}

impl FromStr for Anchor {
    type Err = AnchorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(edge_word) = words.next() else {
            return Err(AnchorParseError::new(s, "empty"));
        };
        let edge =
            Edge::parse(edge_word).ok_or_else(|| AnchorParseError::new(s, "unknown element edge"))?;
        let viewport = match words.next() {
            // A lone edge keyword means "this edge meets the same viewport edge".
            None => edge.fraction(),
            Some(word) => {
                if let Some(vp) = Edge::parse(word) {
                    vp.fraction()
                } else if let Some(pct) = word.strip_suffix('%') {
                    let value: f64 = pct
                        .parse()
                        .map_err(|_| AnchorParseError::new(s, "bad percentage"))?;
                    if !(0.0..=100.0).contains(&value) {
                        return Err(AnchorParseError::new(s, "percentage out of range"));
                    }
                    value / 100.0
                } else {
                    return Err(AnchorParseError::new(s, "unknown viewport point"));
                }
            }
        };
        if words.next().is_some() {
            return Err(AnchorParseError::new(s, "trailing input"));
        }
        Ok(Self::new(edge, viewport))
    }
}

impl TryFrom<String> for Anchor {
    type Error = AnchorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.to_string()
    }
}
