//! Subject module
//!
//! Users and groups that own permission trees and inherit from each other.
//!
//! ## Inheritance Model
//!
//! ```text
//! user's own rules → groups (in order) → their parents (in order) → ...
//! ```
//!
//! A lookup stops at the first subject whose own tree has an explicit
//! allow or deny. Only a total miss falls through to the next subject, so the
//! order of memberships and parents is significant.
//!
//! ## Example
//!
//! ```
//! use regula::{Context, Registry};
//!
//! let mut registry = Registry::new();
//! let guest = registry.create_group("Guest");
//! let alex = registry.create_user("Alex");
//! registry.add_group(alex, guest).unwrap();
//! registry
//!     .set_group_permission(guest, "essentials.tpa", true, Context::new())
//!     .unwrap();
//!
//! assert!(registry.has_permission(alex, "essentials.tpa", &Context::new()));
//! assert!(!registry.has_permission(alex, "essentials.fly", &Context::new()));
//! ```

pub mod registry;
pub mod resolver;
pub mod types;

pub use registry::Registry;
pub use resolver::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT, Resolution, ResolverOptions, Source};
pub use types::{Group, GroupId, Subject, User, UserId};
