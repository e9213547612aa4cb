//! Permission tree
//!
//! A segment-keyed trie. Each node holds an append-only list of rules and
//! owns its children.
//!
//! Lookup walks the query path as far as it exists, then scans from the
//! deepest node back to the root and, within each node, from the newest rule
//! to the oldest. The first rule that matches by depth and context wins:
//!
//! - at the exact requested depth only non-wildcard rules apply
//! - above it only wildcard rules apply
//!
//! Context specificity does not outrank recency: a generic rule set after a
//! context-specific one on the same node shadows it.

use crate::permission::path::PermissionPath;
use crate::permission::types::{Context, PermissionEntry, PermissionState};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// A node in the permission tree
///
/// Ids may be arbitrarily deep, so nothing that walks the tree (drop, counting,
/// debug output) recurses per segment.
#[derive(Default)]
pub struct Node {
    entries: Vec<PermissionEntry>,
    children: HashMap<String, Node>,
}

impl Node {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rule.
    ///
    /// Missing nodes along the path are created. Earlier rules for the same
    /// id are kept; the new one takes precedence over them at lookup time.
    pub fn set(&mut self, permission: &str, value: bool, context: Context) {
        let path = PermissionPath::for_rule(permission);

        let mut current = self;
        for segment in path.segments() {
            current = current.children.entry((*segment).to_string()).or_default();
        }

        trace!(
            permission,
            value,
            wildcard = path.is_wildcard(),
            context = %context,
            "Recording permission rule"
        );
        current
            .entries
            .push(PermissionEntry::new(path.is_wildcard(), value, context));
    }

    /// Look up a permission for the given context
    pub fn get(&self, permission: &str, context: &Context) -> PermissionState {
        let path = PermissionPath::for_query(permission);
        let depth = path.depth();

        let mut nodes = Vec::with_capacity(depth + 1);
        nodes.push(self);
        let mut current = self;
        for segment in path.segments() {
            match current.children.get(*segment) {
                Some(next) => {
                    nodes.push(next);
                    current = next;
                }
                None => break,
            }
        }

        for (level, node) in nodes.iter().enumerate().rev() {
            let matched = node.entries.iter().rev().find(|entry| {
                applies_at(entry, level, depth) && entry.context.is_satisfied_by(context)
            });
            if let Some(entry) = matched {
                trace!(
                    permission,
                    level,
                    wildcard = entry.wildcard,
                    value = entry.value.value,
                    "Matched permission rule"
                );
                return entry.value;
            }
        }

        PermissionState::UNSET
    }

    /// Rules recorded directly on this node, oldest first
    pub fn entries(&self) -> &[PermissionEntry] {
        &self.entries
    }

    pub fn child(&self, segment: &str) -> Option<&Node> {
        self.children.get(segment)
    }

    /// Node addressed by a rule id (`"a.b"` and `"a.b.*"` are the same node)
    pub fn find(&self, permission: &str) -> Option<&Node> {
        PermissionPath::for_rule(permission)
            .segments()
            .iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// No rules and no children
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.children.is_empty()
    }

    /// Total number of rules in this subtree
    pub fn rule_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += node.entries.len();
            pending.extend(node.children.values());
        }
        count
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<Node> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut children: Vec<&str> = self.children.keys().map(String::as_str).collect();
        children.sort_unstable();
        f.debug_struct("Node")
            .field("entries", &self.entries)
            .field("children", &children)
            .finish()
    }
}

fn applies_at(entry: &PermissionEntry, level: usize, depth: usize) -> bool {
    if level == depth {
        !entry.wildcard
    } else {
        level < depth && entry.wildcard
    }
}
