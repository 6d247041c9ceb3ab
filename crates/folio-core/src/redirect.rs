#![forbid(unsafe_code)]

//! Legacy route table.
//!
//! The site used to have one page per section. Those paths now answer with
//! a permanent redirect to the matching anchor on `/`. Matching looks at the
//! first path segment only, so `/about/team` still lands on `/#about`.
//! Query strings and fragments are ignored and trailing slashes tolerated.

use std::fmt;

/// Status used for every legacy redirect.
pub const MOVED_PERMANENTLY: u16 = 301;

const LEGACY: &[(&str, &str)] = &[
    ("about", "/#about"),
    ("projects", "/#projects"),
    ("project", "/#projects"),
    ("contact", "/#contact"),
];

/// How a request path is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The single-page site.
    Page,
    Redirect { status: u16, location: &'static str },
    NotFound,
}

impl Route {
    /// HTTP status for this route.
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::Page => 200,
            Self::Redirect { status, .. } => status,
            Self::NotFound => 404,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => f.write_str("200 page"),
            Self::Redirect { status, location } => write!(f, "{status} -> {location}"),
            Self::NotFound => f.write_str("404 not found"),
        }
    }
}

/// Resolve a request path.
#[must_use]
pub fn resolve(path: &str) -> Route {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let Some(first) = segments.next() else {
        return Route::Page;
    };
    LEGACY
        .iter()
        .find(|(slug, _)| *slug == first)
        .map_or(Route::NotFound, |&(_, location)| Route::Redirect {
            status: MOVED_PERMANENTLY,
            location,
        })
}
