//! Inheritance resolver
//!
//! Resolves a permission for a user or group with the following precedence
//! (highest to lowest):
//! 1. The subject's own tree
//! 2. Each referenced group in declaration order, recursively
//!
//! The first explicit result wins, and a deny counts as found. Resolution is
//! guarded against cycles: a group that is re-entered while still being
//! resolved contributes nothing, and a group already explored without a hit
//! is skipped.

use crate::permission::{Context, PermissionState};
use crate::subject::types::{Group, GroupId, Subject, User, UserId};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Default bound on inheritance depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest depth bound honored; resolution recurses once per inheritance hop
pub const MAX_DEPTH_LIMIT: usize = 256;

/// Resolver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Maximum number of inheritance hops followed from the queried subject,
    /// clamped to [`MAX_DEPTH_LIMIT`]
    pub max_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Subject whose tree supplied a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Source {
    User(UserId),
    Group(GroupId),
}

/// Result of a resolution along with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved state
    pub state: PermissionState,
    /// Where it came from; `None` when unset
    pub source: Option<Source>,
    /// Number of times a cycle was cut during resolution
    pub cycles_detected: usize,
    /// Whether the depth bound cut off part of the inheritance graph
    pub depth_limited: bool,
}

impl Resolution {
    pub fn unset() -> Self {
        Self {
            state: PermissionState::UNSET,
            source: None,
            cycles_detected: 0,
            depth_limited: false,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.state.is_granted()
    }
}

/// One resolution run over a set of groups
pub(crate) struct Resolver<'a> {
    groups: &'a [Group],
    options: ResolverOptions,
    permission: &'a str,
    context: &'a Context,
    /// Groups currently on the resolution stack
    visiting: HashSet<GroupId>,
    /// Groups fully explored without a hit
    exhausted: HashSet<GroupId>,
    cycles: usize,
    depth_cutoffs: usize,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        groups: &'a [Group],
        options: ResolverOptions,
        permission: &'a str,
        context: &'a Context,
    ) -> Self {
        let options = ResolverOptions {
            max_depth: options.max_depth.min(MAX_DEPTH_LIMIT),
        };
        Self {
            groups,
            options,
            permission,
            context,
            visiting: HashSet::new(),
            exhausted: HashSet::new(),
            cycles: 0,
            depth_cutoffs: 0,
        }
    }

    /// Resolve for a user: own tree, then memberships in order
    pub(crate) fn resolve_user(mut self, id: UserId, user: &User) -> Resolution {
        debug!(
            user = user.name(),
            permission = self.permission,
            context = %self.context,
            "Resolving user permission"
        );

        let own = user.own_permission(self.permission, self.context);
        if own.is_set() {
            trace!(user = user.name(), state = %own, "Matched user's own rule");
            return self.finish(own, Some(Source::User(id)));
        }

        for &group in user.groups() {
            if let Some((state, source)) = self.resolve_group(group, 1) {
                return self.finish(state, Some(Source::Group(source)));
            }
        }

        self.finish(PermissionState::UNSET, None)
    }

    /// Resolve for a group: own tree, then parents in order
    pub(crate) fn resolve_root_group(mut self, id: GroupId) -> Resolution {
        debug!(
            group = %id,
            permission = self.permission,
            context = %self.context,
            "Resolving group permission"
        );

        match self.resolve_group(id, 0) {
            Some((state, source)) => self.finish(state, Some(Source::Group(source))),
            None => self.finish(PermissionState::UNSET, None),
        }
    }

    fn resolve_group(&mut self, id: GroupId, depth: usize) -> Option<(PermissionState, GroupId)> {
        if self.exhausted.contains(&id) {
            trace!(group = %id, "Group already explored without a match");
            return None;
        }
        if self.visiting.contains(&id) {
            self.cycles += 1;
            warn!(
                group = %id,
                permission = self.permission,
                "Inheritance cycle detected, treating as no rule found"
            );
            return None;
        }
        if depth > self.options.max_depth {
            self.depth_cutoffs += 1;
            warn!(
                group = %id,
                max_depth = self.options.max_depth,
                "Inheritance depth limit reached, treating as no rule found"
            );
            return None;
        }
        let groups = self.groups;
        let Some(group) = groups.get(id.index()) else {
            debug!(group = %id, "Unknown group handle, treating as no rule found");
            return None;
        };

        let own = group.own_permission(self.permission, self.context);
        if own.is_set() {
            trace!(group = group.name(), depth, state = %own, "Matched group rule");
            return Some((own, id));
        }

        let cutoffs_before = self.depth_cutoffs;
        self.visiting.insert(id);
        let found = group
            .parents()
            .iter()
            .find_map(|&parent| self.resolve_group(parent, depth + 1));
        self.visiting.remove(&id);

        // A subtree truncated by the depth bound may still match via a shorter path.
        if found.is_none() && self.depth_cutoffs == cutoffs_before {
            self.exhausted.insert(id);
        }
        found
    }

    fn finish(self, state: PermissionState, source: Option<Source>) -> Resolution {
        Resolution {
            state,
            source,
            cycles_detected: self.cycles,
            depth_limited: self.depth_cutoffs > 0,
        }
    }
}
