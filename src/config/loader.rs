//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BunConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a configuration from a TOML file without validating it.
///
/// Callers overlay the environment first and validate the merged result.
pub fn load_config(path: &Path) -> Result<BunConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Validate a fully merged configuration.
pub fn finalize(config: BunConfig) -> Result<BunConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("httpbun-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "[routing]\nallowed_hosts = [\"a.example.com\"]\nforce_https = true\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(config.routing.allowed_hosts, vec!["a.example.com".to_string()]);
        assert!(config.routing.force_https);
    }

    #[test]
    fn test_finalize_reports_validation() {
        let mut config = BunConfig::default();
        config.timeouts.request_secs = 0;

        let err = finalize(config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: request_secs must be greater than zero"
        );
    }
}
