//! Permission id parsing
//!
//! Permission ids are dot-separated segment paths (`"essentials.fly"`). A
//! trailing `*` segment marks a rule as a subtree wildcard when it is set.

/// Segment that marks a wildcard rule
pub const WILDCARD_SEGMENT: &str = "*";

/// Segment separator
pub const SEPARATOR: char = '.';

/// A permission id split into segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionPath<'a> {
    segments: Vec<&'a str>,
    wildcard: bool,
}

impl<'a> PermissionPath<'a> {
    /// Parse an id for writing a rule.
    ///
    /// A trailing `*` is stripped and recorded as the wildcard flag, so
    /// `"admin.*"` and `"admin"` address the same node.
    pub fn for_rule(id: &'a str) -> Self {
        let mut segments = split(id);
        let wildcard = segments.last() == Some(&WILDCARD_SEGMENT);
        if wildcard {
            segments.pop();
        }
        Self { segments, wildcard }
    }

    /// Parse an id for a lookup. Every segment is kept literally.
    pub fn for_query(id: &'a str) -> Self {
        Self {
            segments: split(id),
            wildcard: false,
        }
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Number of segments (the requested depth)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

// An empty id yields a single empty segment.
fn split(id: &str) -> Vec<&str> {
    id.split(SEPARATOR).collect()
}
