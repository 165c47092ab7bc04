mod file_config;

pub use file_config::{CatalogConfig, FileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::ThrottleConfig;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub discogs_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub discogs_token: String,
    pub throttle: ThrottleSettings,
}

#[derive(Debug, Clone)]
pub struct ThrottleSettings {
    pub min_interval_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub max_retries: u32,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        let defaults = ThrottleConfig::default();
        Self {
            min_interval_ms: defaults.min_interval.as_millis() as u64,
            backoff_base_ms: defaults.backoff_base.as_millis() as u64,
            backoff_cap_ms: defaults.backoff_cap.as_millis() as u64,
            max_retries: defaults.max_retries,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let port = file.port.unwrap_or(cli.port);

        let discogs_token = match file.discogs_token.or_else(|| cli.discogs_token.clone()) {
            Some(token) if !token.trim().is_empty() => token,
            _ => bail!(
                "Discogs token must be specified via --discogs-token, DISCOGS_TOKEN or in config file"
            ),
        };

        let catalog = file.catalog.unwrap_or_default();
        let throttle_defaults = ThrottleSettings::default();
        let throttle = ThrottleSettings {
            min_interval_ms: catalog
                .min_interval_ms
                .unwrap_or(throttle_defaults.min_interval_ms),
            backoff_base_ms: catalog
                .backoff_base_ms
                .unwrap_or(throttle_defaults.backoff_base_ms),
            backoff_cap_ms: catalog
                .backoff_cap_ms
                .unwrap_or(throttle_defaults.backoff_cap_ms),
            max_retries: catalog.max_retries.unwrap_or(throttle_defaults.max_retries),
        };

        Ok(Self {
            db_path,
            port,
            discogs_token,
            throttle,
        })
    }

    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            min_interval: Duration::from_millis(self.throttle.min_interval_ms),
            backoff_base: Duration::from_millis(self.throttle.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.throttle.backoff_cap_ms),
            max_retries: self.throttle.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> CliConfig {
        CliConfig {
            db_path: Some(PathBuf::from("/data/lists.db")),
            port: 3001,
            discogs_token: Some("cli-token".to_string()),
        }
    }

    #[test]
    fn test_resolve_cli_only() {
        let config = AppConfig::resolve(&base_cli(), None).unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/lists.db"));
        assert_eq!(config.port, 3001);
        assert_eq!(config.discogs_token, "cli-token");
        assert_eq!(config.throttle.min_interval_ms, 1100);
        assert_eq!(config.throttle.max_retries, 3);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let file_config = FileConfig {
            db_path: Some("/toml/lists.db".to_string()),
            port: Some(4000),
            discogs_token: Some("toml-token".to_string()),
            catalog: Some(CatalogConfig {
                min_interval_ms: Some(500),
                max_retries: Some(5),
                ..Default::default()
            }),
        };

        let config = AppConfig::resolve(&base_cli(), Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_path, PathBuf::from("/toml/lists.db"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.discogs_token, "toml-token");
        assert_eq!(config.throttle.min_interval_ms, 500);
        assert_eq!(config.throttle.max_retries, 5);
        // Defaults fill the rest of the catalog section
        assert_eq!(config.throttle.backoff_base_ms, 5000);
        assert_eq!(config.throttle.backoff_cap_ms, 30000);
    }

    #[test]
    fn test_resolve_missing_db_path_error() {
        let cli = CliConfig {
            db_path: None,
            ..base_cli()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_path must be specified"));
    }

    #[test]
    fn test_resolve_missing_token_error() {
        let cli = CliConfig {
            discogs_token: None,
            ..base_cli()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_throttle_config_conversion() {
        let config = AppConfig::resolve(&base_cli(), None).unwrap();
        let throttle = config.throttle_config();
        assert_eq!(throttle.min_interval, Duration::from_millis(1100));
        assert_eq!(throttle.backoff_base, Duration::from_millis(5000));
        assert_eq!(throttle.backoff_cap, Duration::from_millis(30000));
    }
}
