//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (REGULA__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::{AppConfig, RuleSpec};
use crate::error::ConfigError;
use crate::subject::MAX_DEPTH_LIMIT;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "regula.toml",
    ".regula.toml",
    "~/.config/regula/config.toml",
    "/etc/regula/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with REGULA prefix
    // e.g., REGULA__LOGGING__LEVEL, REGULA__RESOLVER__MAX_DEPTH
    // Double underscore (__) maps to nested keys (resolver.max_depth)
    builder = builder.add_source(
        Environment::with_prefix("REGULA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.resolver.max_depth == 0 {
        return Err(ConfigError::Invalid {
            message: "resolver.max_depth must be greater than 0".to_string(),
        });
    }
    if config.resolver.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Invalid {
            message: format!(
                "resolver.max_depth must be at most {}, got {}",
                MAX_DEPTH_LIMIT, config.resolver.max_depth
            ),
        });
    }

    validate_policy(config)
}

/// Validate names and references in the policy
fn validate_policy(config: &AppConfig) -> Result<(), ConfigError> {
    let policy = &config.policy;

    let mut group_names = HashSet::new();
    for (index, group) in policy.groups.iter().enumerate() {
        if group.name.is_empty() {
            return Err(ConfigError::Missing {
                field: format!("policy.groups[{}].name", index),
            });
        }
        if !group_names.insert(group.name.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!("duplicate group name '{}'", group.name),
            });
        }
        validate_rules(
            &group.permissions,
            &format!("policy.groups[{}].permissions", index),
        )?;
    }

    for group in &policy.groups {
        for parent in &group.parents {
            if !group_names.contains(parent.as_str()) {
                return Err(ConfigError::UnknownGroup {
                    referenced_by: format!("group '{}'", group.name),
                    group: parent.clone(),
                });
            }
        }
    }

    let mut user_names = HashSet::new();
    for (index, user) in policy.users.iter().enumerate() {
        if user.name.is_empty() {
            return Err(ConfigError::Missing {
                field: format!("policy.users[{}].name", index),
            });
        }
        if !user_names.insert(user.name.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!("duplicate user name '{}'", user.name),
            });
        }
        for group in &user.groups {
            if !group_names.contains(group.as_str()) {
                return Err(ConfigError::UnknownGroup {
                    referenced_by: format!("user '{}'", user.name),
                    group: group.clone(),
                });
            }
        }
        validate_rules(
            &user.permissions,
            &format!("policy.users[{}].permissions", index),
        )?;
    }

    Ok(())
}

/// Ids are free-form, but an empty one is almost certainly a typo in a file
fn validate_rules(rules: &[RuleSpec], field_path: &str) -> Result<(), ConfigError> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.id.is_empty() {
            return Err(ConfigError::Missing {
                field: format!("{}[{}].id", field_path, index),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{GroupSpec, PolicyConfig, ResolverConfig, UserSpec};

    #[test]
    fn test_load_config_from_str_basic() {
        let toml = r#"
[logging]
level = "debug"
format = "json"

[resolver]
max_depth = 8
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, crate::config::LogFormat::Json);
        assert_eq!(config.resolver.max_depth, 8);
    }

    #[test]
    fn test_load_policy_from_str() {
        let toml = r#"
[[policy.groups]]
name = "guest"

[[policy.groups.permissions]]
id = "essentials.tpa"
value = true

[[policy.groups]]
name = "member"
parents = ["guest"]

[[policy.groups.permissions]]
id = "worldguard.build"
value = false
context = { world = "nether" }

[[policy.users]]
name = "alex"
groups = ["member"]
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.policy.groups.len(), 2);
        let member = &config.policy.groups[1];
        assert_eq!(member.parents, vec!["guest"]);
        assert_eq!(member.permissions[0].context.get("world"), Some("nether"));
        assert_eq!(config.policy.users[0].groups, vec!["member"]);
    }

    #[test]
    fn test_zero_max_depth_error() {
        let config = AppConfig {
            resolver: ResolverConfig { max_depth: 0 },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_max_depth_above_limit_error() {
        let config = AppConfig {
            resolver: ResolverConfig {
                max_depth: MAX_DEPTH_LIMIT + 1,
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("at most 256"));

        let config = AppConfig {
            resolver: ResolverConfig {
                max_depth: MAX_DEPTH_LIMIT,
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_parent_error() {
        let config = AppConfig {
            policy: PolicyConfig {
                groups: vec![GroupSpec {
                    name: "vip".to_string(),
                    parents: vec!["member".to_string()],
                    ..Default::default()
                }],
                users: vec![],
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::UnknownGroup { .. })
        ));
    }

    #[test]
    fn test_forward_parent_reference_is_valid() {
        let config = AppConfig {
            policy: PolicyConfig {
                groups: vec![
                    GroupSpec {
                        name: "vip".to_string(),
                        parents: vec!["member".to_string()],
                        ..Default::default()
                    },
                    GroupSpec {
                        name: "member".to_string(),
                        ..Default::default()
                    },
                ],
                users: vec![],
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_group_error() {
        let group = GroupSpec {
            name: "guest".to_string(),
            ..Default::default()
        };
        let config = AppConfig {
            policy: PolicyConfig {
                groups: vec![group.clone(), group],
                users: vec![],
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_unknown_membership_error() {
        let config = AppConfig {
            policy: PolicyConfig {
                groups: vec![],
                users: vec![UserSpec {
                    name: "alex".to_string(),
                    groups: vec!["vip".to_string()],
                    ..Default::default()
                }],
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::UnknownGroup { .. })
        ));
    }

    #[test]
    fn test_empty_rule_id_error() {
        let toml = r#"
[[policy.users]]
name = "alex"

[[policy.users.permissions]]
id = ""
value = true
"#;

        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_missing_file_error() {
        let result = load_config(Some("/definitely/not/here/regula.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
