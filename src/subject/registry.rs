//! Subject registry
//!
//! Arena owning every group and user. Subjects refer to each other through
//! [`GroupId`] handles, so shared groups are stored once and cyclic links are
//! representable without reference cycles.

use crate::config::{PolicyConfig, RuleSpec};
use crate::error::{ConfigError, RegistryError};
use crate::permission::{Context, PermissionState};
use crate::subject::resolver::{Resolution, Resolver, ResolverOptions, Source};
use crate::subject::types::{Group, GroupId, Subject, User, UserId};
use tracing::{debug, trace};

/// Arena of groups and users
#[derive(Debug, Default)]
pub struct Registry {
    groups: Vec<Group>,
    users: Vec<User>,
    options: ResolverOptions,
}

impl Registry {
    /// Create an empty registry with default resolver options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ResolverOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Build a registry from a declarative policy.
    ///
    /// All groups are created first so parents may be declared after their
    /// children. Links and rules are applied in declaration order.
    pub fn from_policy(
        policy: &PolicyConfig,
        options: ResolverOptions,
    ) -> Result<Self, ConfigError> {
        let mut registry = Self::with_options(options);

        let group_ids: Vec<GroupId> = policy
            .groups
            .iter()
            .map(|spec| registry.create_group(&spec.name))
            .collect();

        for (spec, &id) in policy.groups.iter().zip(&group_ids) {
            for parent in &spec.parents {
                let parent_id =
                    registry
                        .find_group(parent)
                        .ok_or_else(|| ConfigError::UnknownGroup {
                            referenced_by: format!("group '{}'", spec.name),
                            group: parent.clone(),
                        })?;
                registry.add_parent(id, parent_id)?;
            }
            if let Some(group) = registry.group_mut(id) {
                apply_rules(group, &spec.permissions);
            }
        }

        for spec in &policy.users {
            let id = registry.create_user(&spec.name);
            for name in &spec.groups {
                let group_id =
                    registry
                        .find_group(name)
                        .ok_or_else(|| ConfigError::UnknownGroup {
                            referenced_by: format!("user '{}'", spec.name),
                            group: name.clone(),
                        })?;
                registry.add_group(id, group_id)?;
            }
            if let Some(user) = registry.user_mut(id) {
                apply_rules(user, &spec.permissions);
            }
        }

        debug!(
            groups = registry.group_count(),
            users = registry.user_count(),
            "Built registry from policy"
        );
        Ok(registry)
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Create an empty group
    pub fn create_group(&mut self, name: impl Into<String>) -> GroupId {
        let id = GroupId(self.groups.len());
        let group = Group::new(name);
        trace!(group = group.name(), id = %id, "Created group");
        self.groups.push(group);
        id
    }

    /// Create an empty user with no memberships
    pub fn create_user(&mut self, name: impl Into<String>) -> UserId {
        let id = UserId(self.users.len());
        let user = User::new(name);
        trace!(user = user.name(), id = %id, "Created user");
        self.users.push(user);
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.index())
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.index())
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(id.index())
    }

    pub fn user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(id.index())
    }

    /// First group with the given name, in creation order
    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups
            .iter()
            .position(|g| g.name() == name)
            .map(GroupId)
    }

    /// First user with the given name, in creation order
    pub fn find_user(&self, name: &str) -> Option<UserId> {
        self.users.iter().position(|u| u.name() == name).map(UserId)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// All groups with their handles, in creation order
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    /// All users with their handles, in creation order
    pub fn users(&self) -> impl Iterator<Item = (UserId, &User)> {
        self.users.iter().enumerate().map(|(i, u)| (UserId(i), u))
    }

    /// Append a parent to a group. Order is significant; duplicates and
    /// cycles are allowed.
    pub fn add_parent(&mut self, child: GroupId, parent: GroupId) -> Result<(), RegistryError> {
        if self.group(parent).is_none() {
            return Err(RegistryError::UnknownGroup(parent));
        }
        let group = self
            .group_mut(child)
            .ok_or(RegistryError::UnknownGroup(child))?;
        group.push_parent(parent);
        trace!(child = %child, parent = %parent, "Added parent group");
        Ok(())
    }

    /// Append a group membership to a user. Order is significant.
    pub fn add_group(&mut self, user: UserId, group: GroupId) -> Result<(), RegistryError> {
        if self.group(group).is_none() {
            return Err(RegistryError::UnknownGroup(group));
        }
        let member = self
            .user_mut(user)
            .ok_or(RegistryError::UnknownUser(user))?;
        member.push_group(group);
        trace!(user = %user, group = %group, "Added group membership");
        Ok(())
    }

    /// Record a rule on a group's own tree
    pub fn set_group_permission(
        &mut self,
        id: GroupId,
        permission: &str,
        value: bool,
        context: Context,
    ) -> Result<(), RegistryError> {
        self.group_mut(id)
            .ok_or(RegistryError::UnknownGroup(id))?
            .set_permission(permission, value, context);
        Ok(())
    }

    /// Record a rule on a user's own tree
    pub fn set_user_permission(
        &mut self,
        id: UserId,
        permission: &str,
        value: bool,
        context: Context,
    ) -> Result<(), RegistryError> {
        self.user_mut(id)
            .ok_or(RegistryError::UnknownUser(id))?
            .set_permission(permission, value, context);
        Ok(())
    }

    /// Resolve a group permission with inheritance
    pub fn group_permission(
        &self,
        id: GroupId,
        permission: &str,
        context: &Context,
    ) -> PermissionState {
        self.explain_group(id, permission, context).state
    }

    /// Resolve a user permission with inheritance
    pub fn user_permission(
        &self,
        id: UserId,
        permission: &str,
        context: &Context,
    ) -> PermissionState {
        self.explain_user(id, permission, context).state
    }

    /// Explicitly set and true for the user
    pub fn has_permission(&self, id: UserId, permission: &str, context: &Context) -> bool {
        self.user_permission(id, permission, context).is_granted()
    }

    /// Resolve a group permission and report where the answer came from
    pub fn explain_group(&self, id: GroupId, permission: &str, context: &Context) -> Resolution {
        Resolver::new(&self.groups, self.options, permission, context).resolve_root_group(id)
    }

    /// Resolve a user permission and report where the answer came from
    pub fn explain_user(&self, id: UserId, permission: &str, context: &Context) -> Resolution {
        match self.user(id) {
            Some(user) => Resolver::new(&self.groups, self.options, permission, context)
                .resolve_user(id, user),
            None => {
                debug!(user = %id, "Unknown user handle, treating as no rule found");
                Resolution::unset()
            }
        }
    }

    /// Display name of a subject
    pub fn subject_name(&self, source: Source) -> Option<&str> {
        match source {
            Source::User(id) => self.user(id).map(|u| u.name()),
            Source::Group(id) => self.group(id).map(|g| g.name()),
        }
    }
}

fn apply_rules<S: Subject>(subject: &mut S, rules: &[RuleSpec]) {
    for rule in rules {
        subject.set_permission(&rule.id, rule.value, rule.context.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_sequential() {
        let mut registry = Registry::new();
        let a = registry.create_group("A");
        let b = registry.create_group("B");
        let u = registry.create_user("alex");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(u.index(), 0);
        assert_eq!(registry.find_group("B"), Some(b));
        assert_eq!(registry.find_user("alex"), Some(u));
        assert_eq!(registry.find_group("missing"), None);
    }

    #[test]
    fn test_add_parent_unknown_handle() {
        let mut registry = Registry::new();
        let a = registry.create_group("A");
        let err = registry.add_parent(a, GroupId(9)).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownGroup(GroupId(9))));
        let err = registry.add_parent(GroupId(5), a).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownGroup(GroupId(5))));
    }

    #[test]
    fn test_add_group_unknown_user() {
        let mut registry = Registry::new();
        let a = registry.create_group("A");
        let err = registry.add_group(UserId(3), a).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownUser(UserId(3))));
    }

    #[test]
    fn test_links_keep_order_and_duplicates() {
        let mut registry = Registry::new();
        let a = registry.create_group("A");
        let b = registry.create_group("B");
        let c = registry.create_group("C");
        registry.add_parent(c, b).unwrap();
        registry.add_parent(c, a).unwrap();
        registry.add_parent(c, b).unwrap();
        assert_eq!(registry.group(c).unwrap().parents(), &[b, a, b]);
    }

    #[test]
    fn test_unknown_subject_queries_are_unset() {
        let registry = Registry::new();
        assert_eq!(
            registry.user_permission(UserId(0), "a", &Context::new()),
            PermissionState::UNSET
        );
        assert_eq!(
            registry.group_permission(GroupId(0), "a", &Context::new()),
            PermissionState::UNSET
        );
    }

    #[test]
    fn test_explain_reports_source() {
        let mut registry = Registry::new();
        let guest = registry.create_group("Guest");
        let user = registry.create_user("alex");
        registry.add_group(user, guest).unwrap();
        registry
            .set_group_permission(guest, "essentials.tpa", true, Context::new())
            .unwrap();

        let resolution = registry.explain_user(user, "essentials.tpa", &Context::new());
        assert!(resolution.is_granted());
        assert_eq!(resolution.source, Some(Source::Group(guest)));
        assert_eq!(registry.subject_name(Source::Group(guest)), Some("Guest"));
    }
}
