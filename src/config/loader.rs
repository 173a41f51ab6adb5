//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in order:
//! compiled defaults, `takedown.*`, `takedown.<environment>.*`, then
//! `TAKEDOWN__SECTION__FIELD` environment variables.

use super::error::{ConfigResult, ConfigurationError};
use super::TakedownConfig;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ENV_PREFIX: &str = "TAKEDOWN";
const BASE_FILE_NAME: &str = "takedown";

/// Holds the validated configuration and where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TakedownConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Useful in tests that should not touch process-wide environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading takedown configuration"
        );

        let config = Self::build(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = %environment,
            dmca_timeout_seconds = config.orchestration.dmca_timeout_seconds,
            delisting_timeout_seconds = config.orchestration.delisting_timeout_seconds,
            verification_enabled = config.verification.enabled,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: TakedownConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: Self::detect_environment(),
            config_directory: PathBuf::from("config"),
        }))
    }

    fn build(directory: &Path, environment: &str) -> ConfigResult<TakedownConfig> {
        let load_error = |source| ConfigurationError::Load {
            environment: environment.to_string(),
            source,
        };

        let base = directory.join(BASE_FILE_NAME);
        let overrides = directory.join(format!("{BASE_FILE_NAME}.{environment}"));

        config::Config::builder()
            .add_source(config::Config::try_from(&TakedownConfig::default()).map_err(load_error)?)
            .add_source(config::File::with_name(&base.to_string_lossy()).required(false))
            .add_source(config::File::with_name(&overrides.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(load_error)?
            .try_deserialize()
            .map_err(load_error)
    }

    /// Detect the deployment environment from process variables
    pub fn detect_environment() -> String {
        env::var("TAKEDOWN_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &TakedownConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchEngine;
    use std::fs;

    #[test]
    fn test_missing_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        assert_eq!(manager.config(), &TakedownConfig::default());
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("takedown.yaml"),
            "orchestration:\n  dmca_timeout_seconds: 120\nverification:\n  delay_seconds: 600\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("takedown.test.yaml"),
            "verification:\n  delay_seconds: 5\norchestration:\n  default_search_engines: [google]\n",
        )
        .unwrap();

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();
        let config = manager.config();
        assert_eq!(config.orchestration.dmca_timeout_seconds, 120);
        assert_eq!(config.verification.delay_seconds, 5);
        assert_eq!(
            config.orchestration.default_search_engines,
            vec![SearchEngine::Google]
        );
        // Untouched sections keep their defaults
        assert_eq!(
            config.statistics,
            crate::config::StatisticsConfig::default()
        );
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("takedown.yaml"),
            "strategy:\n  high_confidence_threshold: 2.0\n",
        )
        .unwrap();

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }
}
