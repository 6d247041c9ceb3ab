#![forbid(unsafe_code)]

//! Page sections and URL-hash resolution.
//!
//! The section list is defined once at startup and never changes. Display
//! order is list order; trigger registration follows it.

use std::fmt;

use crate::geometry::ElementId;

/// Identifier of a content section (also the URL hash fragment).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(String);

impl SectionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `#id` fragment pushed to history for this section.
    #[must_use]
    pub fn hash(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A navigable content section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    /// Label shown in the desktop nav and mobile tab bar.
    pub label: String,
    /// Element whose box defines the section's extent.
    pub anchor: ElementId,
}

impl Section {
    /// A section whose anchor element id equals its section id.
    #[must_use]
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: SectionId::new(id),
            label: label.to_owned(),
            anchor: ElementId::new(id),
        }
    }
}

/// Ordered, immutable list of sections.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionList {
    sections: Vec<Section>,
}

impl SectionList {
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// The site's sections: home, about, projects, contact.
    #[must_use]
    pub fn portfolio() -> Self {
        Self::new(vec![
            Section::new("home", "Home"),
            Section::new("about", "About"),
            Section::new("projects", "Projects"),
            Section::new("contact", "Contact"),
        ])
    }

    #[must_use]
    pub fn first(&self) -> Option<&Section> {
        self.sections.first()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id.as_str() == id)
    }

    /// Display position of a section.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id.as_str() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Resolve a URL hash (`"#about"`, `"about"`, `""`) to a known section.
    #[must_use]
    pub fn resolve_hash(&self, hash: &str) -> Option<&Section> {
        parse_hash(hash).and_then(|id| self.get(id))
    }
}

impl Default for SectionList {
    fn default() -> Self {
        Self::portfolio()
    }
}

/// Strip the leading `#` from a hash; empty fragments yield `None`.
#[must_use]
pub fn parse_hash(hash: &str) -> Option<&str> {
    let id = hash.trim().trim_start_matches('#');
    if id.is_empty() { None } else { Some(id) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portfolio_order() {
        let list = SectionList::portfolio();
        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["home", "about", "projects", "contact"]);
        assert_eq!(list.position("projects"), Some(2));
        assert_eq!(list.get("about").map(|s| s.label.as_str()), Some("About"));
    }

    #[test]
    fn resolve_hash_variants() {
        let list = SectionList::portfolio();
        assert_eq!(
            list.resolve_hash("#projects").map(|s| s.id.as_str()),
            Some("projects")
        );
        assert_eq!(
            list.resolve_hash("contact").map(|s| s.id.as_str()),
            Some("contact")
        );
        assert!(list.resolve_hash("").is_none());
        assert!(list.resolve_hash("#").is_none());
        assert!(list.resolve_hash("#blog").is_none());
    }

    #[test]
    fn section_hash_fragment() {
        assert_eq!(SectionId::new("about").hash(), "#about");
    }
}
