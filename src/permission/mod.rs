//! Permission tree module
//!
//! Stores boolean permission rules in a trie keyed by dot-separated segments,
//! with wildcard and context refinement.
//!
//! ## Rule Model
//!
//! - `"essentials.fly"` applies to exactly that id
//! - `"essentials.*"` applies to every id below `essentials`
//! - A rule may carry a context (`{"world": "nether"}`) and then only applies
//!   to queries whose context contains the same key-value pairs
//!
//! ## Lookup Precedence
//!
//! 1. Deeper nodes before shallower ones (exact beats wildcard)
//! 2. Within a node, the most recently set rule first
//!
//! A lookup returns a [`PermissionState`], which distinguishes "no rule" from
//! an explicit deny.

pub mod path;
pub mod tree;
pub mod types;

pub use path::PermissionPath;
pub use tree::Node;
pub use types::{Context, PermissionEntry, PermissionState};
