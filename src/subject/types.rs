//! Subject types
//!
//! Groups and users each own one permission tree. Links between subjects are
//! stored as handles into a [`Registry`](crate::subject::Registry), so a group
//! can be shared by any number of users and child groups without duplicating
//! its tree.

use crate::permission::{Context, Node, PermissionState};
use serde::Serialize;
use std::fmt;

/// Handle to a group stored in a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Handle to a user stored in a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(pub(crate) usize);

impl UserId {
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

/// Anything that owns a permission tree
pub trait Subject {
    /// Display name
    fn name(&self) -> &str;

    /// The subject's own rules
    fn tree(&self) -> &Node;

    fn tree_mut(&mut self) -> &mut Node;

    /// Record a rule on the subject's own tree
    fn set_permission(&mut self, permission: &str, value: bool, context: Context) {
        self.tree_mut().set(permission, value, context);
    }

    /// Look up a permission in the subject's own tree only (no inheritance)
    fn own_permission(&self, permission: &str, context: &Context) -> PermissionState {
        self.tree().get(permission, context)
    }
}

/// A named set of rules that can inherit from parent groups
#[derive(Debug)]
pub struct Group {
    name: String,
    tree: Node,
    parents: Vec<GroupId>,
}

impl Group {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree: Node::new(),
            parents: Vec::new(),
        }
    }

    /// Parent groups in declaration order
    pub fn parents(&self) -> &[GroupId] {
        &self.parents
    }

    pub(crate) fn push_parent(&mut self, parent: GroupId) {
        self.parents.push(parent);
    }
}

impl Subject for Group {
    fn name(&self) -> &str {
        &self.name
    }

    fn tree(&self) -> &Node {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut Node {
        &mut self.tree
    }
}

/// An individual with its own rules and group memberships
#[derive(Debug)]
pub struct User {
    name: String,
    tree: Node,
    groups: Vec<GroupId>,
}

impl User {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree: Node::new(),
            groups: Vec::new(),
        }
    }

    /// Group memberships in declaration order
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub(crate) fn push_group(&mut self, group: GroupId) {
        self.groups.push(group);
    }
}

impl Subject for User {
    fn name(&self) -> &str {
        &self.name
    }

    fn tree(&self) -> &Node {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut Node {
        &mut self.tree
    }
}
