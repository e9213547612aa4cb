//! Error types for regula
//!
//! Permission lookups themselves never fail: a missing rule is reported as an
//! unset [`PermissionState`](crate::permission::PermissionState). Errors only
//! arise when wiring subjects together or loading configuration.

use crate::subject::{GroupId, UserId};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Unknown group '{group}' referenced by {referenced_by}")]
    UnknownGroup {
        referenced_by: String,
        group: String,
    },

    #[error("Failed to build registry: {0}")]
    Registry(#[from] RegistryError),
}

/// Errors from linking subjects in a registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown group handle {0}")]
    UnknownGroup(GroupId),

    #[error("Unknown user handle {0}")]
    UnknownUser(UserId),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::UnknownGroup {
            referenced_by: "user 'Alex'".to_string(),
            group: "VIP".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown group 'VIP' referenced by user 'Alex'"
        );

        let err = RegistryError::UnknownGroup(GroupId(4));
        assert_eq!(err.to_string(), "Unknown group handle group#4");
    }

    #[test]
    fn test_config_error_variants() {
        let errors = [
            ConfigError::Load("bad toml".to_string()),
            ConfigError::Invalid {
                message: "resolver.max_depth must be greater than 0".to_string(),
            },
            ConfigError::Missing {
                field: "policy.groups[0].name".to_string(),
            },
            ConfigError::Registry(RegistryError::UnknownGroup(GroupId(2))),
        ];
        for err in errors {
            let app: AppError = err.into();
            assert!(app.to_string().starts_with("Configuration error: "));
        }
    }

    #[test]
    fn test_registry_error_converts_to_app_error() {
        let err: AppError = RegistryError::UnknownUser(UserId(1)).into();
        assert!(matches!(err, AppError::Registry(_)));
        assert!(err.to_string().contains("user#1"));
    }
}
