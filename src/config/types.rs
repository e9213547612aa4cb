//! Configuration types for regula
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::permission::Context;
use crate::subject::{DEFAULT_MAX_DEPTH, ResolverOptions};
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Inheritance resolution settings
    pub resolver: ResolverConfig,

    /// Groups, users and their rules
    pub policy: PolicyConfig,
}

/// Resolver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum inheritance hops followed from the queried subject
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolverConfig {
    pub fn options(&self) -> ResolverOptions {
        ResolverOptions {
            max_depth: self.max_depth,
        }
    }
}

/// Declarative seed for a registry
///
/// Groups may list parents declared later in the file. Rules are applied in
/// the order they are listed, so a later rule overrides an earlier one for
/// the same id and context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub groups: Vec<GroupSpec>,
    pub users: Vec<UserSpec>,
}

/// A group and its rules
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub name: String,

    /// Parent group names, in resolution order
    pub parents: Vec<String>,

    pub permissions: Vec<RuleSpec>,
}

/// A user, its memberships and its own rules
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserSpec {
    pub name: String,

    /// Group names, in resolution order
    pub groups: Vec<String>,

    pub permissions: Vec<RuleSpec>,
}

/// A single rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleSpec {
    /// Permission id, optionally ending in `.*`
    pub id: String,

    /// Allow (true) or deny (false)
    pub value: bool,

    /// Required context
    #[serde(default)]
    pub context: Context,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
