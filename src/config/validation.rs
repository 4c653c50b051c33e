//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("database.path is empty")]
    EmptyDatabasePath,
    #[error("permissions.categories.{0}.required_roles is empty")]
    EmptyCategoryRoles(String),
    #[error("server.metrics_port {0} collides with the command listener")]
    MetricsPortCollision(u16),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.trim().is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if let Some(port) = config.server.metrics_port
        && port == config.server.listen.port()
    {
        errors.push(ValidationError::MetricsPortCollision(port));
    }

    if let Some(ref db) = config.database
        && db.path.trim().is_empty()
    {
        errors.push(ValidationError::EmptyDatabasePath);
    }

    let mut categories: Vec<_> = config.permissions.categories.iter().collect();
    categories.sort_by(|a, b| a.0.cmp(b.0));
    for (category, rule) in categories {
        if rule.required_roles.is_empty() {
            errors.push(ValidationError::EmptyCategoryRoles(category.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryRule, DatabaseConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.server.name = "  ".to_string();
        config.server.metrics_port = Some(config.server.listen.port());
        config.database = Some(DatabaseConfig {
            path: String::new(),
        });
        config
            .permissions
            .categories
            .insert("admin".to_string(), CategoryRule::default());

        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::MissingServerName));
        assert!(matches!(errors[2], ValidationError::EmptyDatabasePath));
        assert!(matches!(errors[3], ValidationError::EmptyCategoryRoles(ref c) if c == "admin"));
    }

    #[test]
    fn test_memory_database_path_is_valid() {
        let mut config = Config::default();
        config.database = Some(DatabaseConfig {
            path: ":memory:".to_string(),
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_database_directory_is_valid() {
        // The directory is created when the database is opened.
        let mut config = Config::default();
        config.database = Some(DatabaseConfig {
            path: "/definitely/not/here/bus.db".to_string(),
        });
        assert!(validate(&config).is_ok());
    }
}
