//! Permission value types
//!
//! Core types shared by the permission tree and subject resolution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key-value refinement narrowing when a rule applies (e.g. `{"world": "nether"}`)
///
/// A rule's context is satisfied by a query context when every key of the
/// rule is present in the query with an equal value. An empty rule context
/// matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, String>);

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a key, returning the previous value if any
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check whether this (rule) context is satisfied by `current`
    pub fn is_satisfied_by(&self, current: &Context) -> bool {
        self.0
            .iter()
            .all(|(key, value)| current.get(key) == Some(value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Context
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// Outcome of a permission lookup
///
/// `value` is only meaningful when `set` is true. The default value means
/// "no rule applies", which is distinct from an explicit deny.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PermissionState {
    /// A rule was found
    pub set: bool,
    /// Allow (true) or deny (false)
    pub value: bool,
}

impl PermissionState {
    /// No applicable rule
    pub const UNSET: Self = Self {
        set: false,
        value: false,
    };

    /// Explicit allow
    pub const ALLOW: Self = Self {
        set: true,
        value: true,
    };

    /// Explicit deny
    pub const DENY: Self = Self {
        set: true,
        value: false,
    };

    /// State for an explicit rule with the given polarity
    pub const fn explicit(value: bool) -> Self {
        Self { set: true, value }
    }

    pub const fn is_set(&self) -> bool {
        self.set
    }

    /// Explicitly set and true
    pub const fn is_granted(&self) -> bool {
        self.set && self.value
    }

    /// Explicitly set and false
    pub const fn is_denied(&self) -> bool {
        self.set && !self.value
    }

    /// `None` when unset, otherwise the rule's polarity
    pub const fn as_option(&self) -> Option<bool> {
        if self.set { Some(self.value) } else { None }
    }

    pub const fn as_str(&self) -> &'static str {
        match (self.set, self.value) {
            (false, _) => "unset",
            (true, true) => "allow",
            (true, false) => "deny",
        }
    }
}

impl From<Option<bool>> for PermissionState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(v) => Self::explicit(v),
            None => Self::UNSET,
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single rule recorded on a tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEntry {
    /// Registered with a trailing `*` segment; covers deeper paths
    pub wildcard: bool,
    /// Required context (empty matches any query)
    pub context: Context,
    /// Always explicitly set
    pub value: PermissionState,
}

impl PermissionEntry {
    pub fn new(wildcard: bool, value: bool, context: Context) -> Self {
        Self {
            wildcard,
            context,
            value: PermissionState::explicit(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_unset() {
        let state = PermissionState::default();
        assert_eq!(state, PermissionState::UNSET);
        assert!(!state.is_set());
        assert!(!state.is_granted());
        assert!(!state.is_denied());
    }

    #[test]
    fn test_state_polarity() {
        assert!(PermissionState::ALLOW.is_granted());
        assert!(PermissionState::DENY.is_denied());
        assert!(!PermissionState::DENY.is_granted());
        assert_eq!(PermissionState::explicit(false), PermissionState::DENY);
    }

    #[test]
    fn test_state_option_conversion() {
        assert_eq!(PermissionState::from(None), PermissionState::UNSET);
        assert_eq!(PermissionState::from(Some(true)), PermissionState::ALLOW);
        assert_eq!(PermissionState::DENY.as_option(), Some(false));
        assert_eq!(PermissionState::UNSET.as_option(), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PermissionState::UNSET.to_string(), "unset");
        assert_eq!(PermissionState::ALLOW.to_string(), "allow");
        assert_eq!(PermissionState::DENY.to_string(), "deny");
    }

    #[test]
    fn test_empty_context_is_satisfied_by_anything() {
        let rule = Context::new();
        assert!(rule.is_satisfied_by(&Context::new()));
        assert!(rule.is_satisfied_by(&Context::from([("world", "nether")])));
    }

    #[test]
    fn test_context_subset_match() {
        let rule = Context::from([("world", "nether")]);
        assert!(rule.is_satisfied_by(&Context::from([("world", "nether"), ("team", "red")])));
        assert!(!rule.is_satisfied_by(&Context::from([("world", "overworld")])));
        assert!(!rule.is_satisfied_by(&Context::new()));
    }

    #[test]
    fn test_context_display_is_sorted() {
        let ctx = Context::new().with("world", "nether").with("team", "red");
        assert_eq!(ctx.to_string(), "{team=red, world=nether}");
        assert_eq!(Context::new().to_string(), "{}");
    }

    #[test]
    fn test_context_serde_is_a_plain_map() {
        let ctx: Context = serde_json::from_str(r#"{"world":"nether"}"#).unwrap();
        assert_eq!(ctx.get("world"), Some("nether"));
        assert_eq!(serde_json::to_string(&ctx).unwrap(), r#"{"world":"nether"}"#);
    }

    #[test]
    fn test_entry_is_always_set() {
        let entry = PermissionEntry::new(true, false, Context::new());
        assert!(entry.value.is_set());
        assert!(entry.wildcard);
    }
}
