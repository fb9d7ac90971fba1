//! Configuration file loading and parsing.

use std::path::Path;

use anyhow::{Context, Result};

use super::model::AppConfig;
use crate::error::ConfigError;
use crate::validation::report::format_report;
use crate::validation::validate_config;

/// Loads the configuration file from disk and parses it.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: AppConfig =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(config)
}

/// Loads the configuration file, or the defaults when no file is given,
/// applies `overrides` and validates the result.
pub fn load_and_validate(
    path: Option<&Path>,
    overrides: impl FnOnce(&mut AppConfig),
) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_from_path(path).context("Failed to load configuration")?,
        None => AppConfig::default(),
    };
    overrides(&mut config);

    check(config)
}

/// Validates an already built configuration, logging warnings.
pub fn check(config: AppConfig) -> Result<AppConfig> {
    let result = validate_config(&config);

    for issue in result.warnings() {
        tracing::warn!(
            path = %issue.path,
            message = %issue.message,
            suggestion = ?issue.suggestion,
            "Config validation warning"
        );
    }

    let errors: Vec<_> = result.errors().collect();
    if !errors.is_empty() {
        tracing::error!("{}", format_report(&result));
        anyhow::bail!(ConfigError::ValidationFailed {
            error_count: errors.len()
        });
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_from_path(Path::new("/nonexistent/swapper.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swapper.yaml");
        std::fs::write(&path, "max_parallel: [").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("swapper.yaml");
        std::fs::write(&path, "max_parallel: 0\n").unwrap();

        let err = load_and_validate(Some(&path), |_| {}).unwrap_err();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::ValidationFailed { error_count: 1 }));
    }

    #[test]
    fn no_file_means_defaults() {
        let config = load_and_validate(None, |_| {}).unwrap();
        assert_eq!(config.max_parallel, 4);
    }

    #[test]
    fn overrides_are_validated() {
        let err = load_and_validate(None, |c| c.max_parallel = 0).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
