//! Configuration management for ledgerite
//!
//! This module handles loading, validation, and management of
//! ledgerite configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigErrorDetails, ConfigResult};

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

// ==================== Configuration Types ====================

/// Journal input settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JournalConfig {
    /// Journal files, read in order
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Price database, read before the journal files
    #[serde(default)]
    pub price_db: Option<PathBuf>,
}

/// Report rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Sort terms, e.g. "d" or "-date"
    #[serde(default)]
    pub sort: Option<String>,
    /// Decimal places shown for amounts
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Column width amounts are right-aligned to
    #[serde(default = "default_amount_width")]
    pub amount_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sort: None,
            decimal_places: default_decimal_places(),
            amount_width: default_amount_width(),
        }
    }
}

impl ReportConfig {
    /// Sort terms split on commas
    pub fn sort_terms(&self) -> Vec<String> {
        self.sort
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_amount_width() -> usize {
    20
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: off, error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Journal input settings
    #[serde(default)]
    pub journal: JournalConfig,
    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::IoError)?;
        let config = Self::from_yaml(&content)?;

        // Relative journal paths are relative to the config file
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolve_paths(base))
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|_| ConfigError::InvalidYaml)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        for file in self.journal.files.iter_mut() {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
        if let Some(price_db) = self.journal.price_db.as_mut() {
            if price_db.is_relative() {
                *price_db = base.join(&*price_db);
            }
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.report.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "report.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if self.report.amount_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "report.amount_width".to_string(),
                reason: "Amount width must be greater than 0".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Check if any journal file is configured
    pub fn has_journal(&self) -> bool {
        !self.journal.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.report.decimal_places, 2);
        assert_eq!(config.report.amount_width, 20);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.has_journal());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("journal:\n  files: [main.ledger]\nreport:\n  sort: \"-d, date\"\n").unwrap();
        assert_eq!(config.journal.files, vec![PathBuf::from("main.ledger")]);
        assert_eq!(config.report.amount_width, 20);
        assert_eq!(config.report.sort_terms(), vec!["-d", "date"]);
    }

    #[test]
    fn test_default_template_is_valid() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.report.decimal_places, 2);
        assert!(config.journal.price_db.is_none());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_yaml("report:\n  decimal_places: 11\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "report.decimal_places"));

        let err = Config::from_yaml("report:\n  amount_width: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = Config::from_yaml("logging:\n  level: loud\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "logging.level"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::from_yaml("journal: [unclosed"), Err(ConfigError::InvalidYaml)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let config = Config::from_yaml("journal:\n  files: [a.ledger, /abs/b.ledger]\n  price_db: prices.db\n")
            .unwrap()
            .resolve_paths(Path::new("/srv/books"));
        assert_eq!(config.journal.files[0], PathBuf::from("/srv/books/a.ledger"));
        assert_eq!(config.journal.files[1], PathBuf::from("/abs/b.ledger"));
        assert_eq!(config.journal.price_db, Some(PathBuf::from("/srv/books/prices.db")));
    }
}
