//! Route classification.
//!
//! # Responsibilities
//! - Decide whether a request path is dynamic or static
//! - Strip the dynamic prefix before registry lookup
//!
//! # Design Decisions
//! - Plain `starts_with` on the prefix: `/apple.png` is dynamic too
//! - Path matching is case-sensitive
//! - No regex, O(1) per request

/// Reserved prefix for handler-backed paths.
pub const DYNAMIC_PREFIX: &str = "/app";

/// Where a request path should be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// Served from the static resource root (full request path).
    Static(&'a str),
    /// Served by a handler (path with the prefix removed).
    Dynamic(&'a str),
}

impl Target<'_> {
    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Static(_) => "static",
            Target::Dynamic(_) => "dynamic",
        }
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Split a path into its static or dynamic target.
    pub fn classify<'a>(&self, path: &'a str) -> Target<'a> {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => Target::Dynamic(rest),
            None => Target::Static(path),
        }
    }
}

impl Default for PathPrefixMatcher {
    fn default() -> Self {
        Self::new(DYNAMIC_PREFIX)
    }
}
