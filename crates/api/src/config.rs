//! Service Configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `MICROBIAL_RISK__*` environment variables (`__` separates sections, e.g.
//! `MICROBIAL_RISK__SERVER__BIND=127.0.0.1:9000`).

use config::{Config, ConfigError, Environment, File};
use risk_classifier::ClassifierConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "config/microbial-risk.toml";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "MICROBIAL_RISK_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub model: ClassifierConfig,
    pub persistence: PersistenceConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output settings; the level comes from `RUST_LOG`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Risk-record persistence settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    /// Upper bound on one write
    pub timeout_ms: u64,
    /// Records retained by the in-memory store
    pub max_records: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2000,
            max_records: 10_000,
        }
    }
}

impl PersistenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Load from `MICROBIAL_RISK_CONFIG` (or the default path) plus the
    /// environment. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Load from an explicit file path plus the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("MICROBIAL_RISK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_classifier::MaxFeatures;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(!config.logging.json);
        assert_eq!(config.model.dataset_path, PathBuf::from("water_potability.csv"));
        assert_eq!(config.model.forest.n_trees, 200);
        assert_eq!(config.model.forest.max_depth, 12);
        assert_eq!(config.model.forest.max_features, MaxFeatures::Sqrt);
        assert_eq!(config.persistence.timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/microbial-risk.toml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.model.forest.min_samples_leaf, 2);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("microbial-risk-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[server]\nbind = \"127.0.0.1:9000\"\n\n[model]\ndataset_path = \"data/wq.csv\"\n\n[model.forest]\nn_trees = 50\nmax_features = \"log2\"\n\n[persistence]\nenabled = false\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.model.dataset_path, PathBuf::from("data/wq.csv"));
        assert_eq!(config.model.forest.n_trees, 50);
        assert_eq!(config.model.forest.max_features, MaxFeatures::Log2);
        // Unset keys keep their defaults
        assert_eq!(config.model.forest.max_depth, 12);
        assert!(!config.persistence.enabled);
        assert_eq!(config.persistence.max_records, 10_000);
    }
}
