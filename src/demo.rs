//! Game server demo scenario
//!
//! A small group ladder (Guest → Member → VIP) with a user who overrides one
//! inherited denial. Used by the `demo` CLI command and the integration tests.

use crate::error::RegistryError;
use crate::permission::Context;
use crate::subject::{GroupId, Registry, UserId};

/// Handles into the scenario registry
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub guest: GroupId,
    pub member: GroupId,
    pub vip: GroupId,
    pub alex: UserId,
}

/// Permission checks printed by the demo
pub fn checks() -> Vec<(&'static str, Context)> {
    vec![
        ("essentials.tpa", Context::new()),
        ("essentials.sethome", Context::new()),
        ("essentials.fly", Context::new()),
        ("essentials.fly", Context::from([("world", "nether")])),
        ("worldguard.build", Context::from([("world", "overworld")])),
        ("worldguard.build", Context::from([("world", "nether")])),
        ("bedwars.join", Context::new()),
    ]
}

/// Populate `registry` with the scenario
pub fn build(registry: &mut Registry) -> Result<Scenario, RegistryError> {
    let nether = || Context::from([("world", "nether")]);

    // Can request teleport, cannot fly
    let guest = registry.create_group("Guest");
    registry.set_group_permission(guest, "essentials.tpa", true, Context::new())?;
    registry.set_group_permission(guest, "essentials.fly", false, Context::new())?;

    // Can set home, build in the overworld but not the nether
    let member = registry.create_group("Member");
    registry.add_parent(member, guest)?;
    registry.set_group_permission(member, "essentials.sethome", true, Context::new())?;
    registry.set_group_permission(
        member,
        "worldguard.build",
        true,
        Context::from([("world", "overworld")]),
    )?;
    registry.set_group_permission(member, "worldguard.build", false, nether())?;

    // Can fly everywhere except the nether
    let vip = registry.create_group("VIP");
    registry.add_parent(vip, member)?;
    registry.set_group_permission(vip, "essentials.fly", true, Context::new())?;
    registry.set_group_permission(vip, "essentials.fly", false, nether())?;

    // Allowed to fly in the nether despite the group rule
    let alex = registry.create_user("Alex");
    registry.add_group(alex, vip)?;
    registry.set_user_permission(alex, "essentials.fly", true, nether())?;

    Ok(Scenario {
        guest,
        member,
        vip,
        alex,
    })
}
