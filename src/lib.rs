//! Regula
//!
//! Hierarchical, context-aware boolean permissions for users and groups.
//!
//! ## Features
//!
//! - **Segment trie** keyed by dot-separated permission ids
//! - **Wildcards** - `admin.*` covers every id below `admin`
//! - **Context refinement** - rules scoped to key-value pairs such as `{"world": "nether"}`
//! - **Group inheritance** - ordered memberships and parents, first explicit answer wins
//! - **Three-valued results** - unset, allow and deny stay distinguishable
//!
//! ## Resolution Model
//!
//! ```text
//! own tree → groups / parents in declaration order (first explicit result wins)
//! ```
//!
//! Within one tree, deeper rules beat shallower ones and, on the same node,
//! the most recently set rule wins.
//!
//! ## Example Configuration
//!
//! ```toml
//! [resolver]
//! max_depth = 32
//!
//! [[policy.groups]]
//! name = "guest"
//!
//! [[policy.groups.permissions]]
//! id = "essentials.tpa"
//! value = true
//!
//! [[policy.users]]
//! name = "alex"
//! groups = ["guest"]
//! ```

pub mod config;
pub mod demo;
pub mod error;
pub mod permission;
pub mod subject;

// Re-export main types
pub use config::{AppConfig, load_config};
pub use error::{AppError, ConfigError, RegistryError, Result};
pub use permission::{Context, Node, PermissionState};
pub use subject::{GroupId, Registry, Resolution, Source, Subject, UserId};
