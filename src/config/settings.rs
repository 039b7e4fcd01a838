//! Store settings loading from config.toml
//!
//! All keys are optional. A missing file yields the defaults, so the shell
//! starts without any configuration on disk.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Inventory thresholds
    #[serde(default)]
    pub inventory: InventorySettings,
    /// Report thresholds
    #[serde(default)]
    pub reports: ReportSettings,
}

/// `[inventory]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InventorySettings {
    /// Stock below this is reported as low
    pub low_stock_threshold: i32,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            low_stock_threshold: 5,
        }
    }
}

/// `[reports]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportSettings {
    /// Lifetime spend at or above this is a high-value customer
    pub high_value_threshold: Decimal,
    /// Lifetime spend at or above this is a mid-value customer
    pub mid_value_threshold: Decimal,
    /// How many customers the purchase report lists
    pub top_customers: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            high_value_threshold: Decimal::from(2000),
            mid_value_threshold: Decimal::from(500),
            top_customers: 10,
        }
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is malformed or the thresholds are
/// inconsistent.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if settings.inventory.low_stock_threshold < 0 {
        return Err(Error::Config {
            message: "low_stock_threshold cannot be negative".to_string(),
        });
    }
    if settings.reports.mid_value_threshold > settings.reports.high_value_threshold {
        return Err(Error::Config {
            message: "mid_value_threshold must not exceed high_value_threshold".to_string(),
        });
    }

    Ok(settings)
}

/// Loads settings from a TOML file, falling back to defaults when it is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No settings file at {path:?}, using defaults");
        return Ok(Settings::default());
    }

    debug!("Loading settings from {path:?}");
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from the default location (./config.toml)
pub fn load_default_settings() -> Result<Settings> {
    load_settings("config.toml")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let settings = parse_settings(
            r#"
            [inventory]
            low_stock_threshold = 3

            [reports]
            high_value_threshold = "5000"
            mid_value_threshold = "1000.50"
            top_customers = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.inventory.low_stock_threshold, 3);
        assert_eq!(settings.reports.high_value_threshold, Decimal::from(5000));
        assert_eq!(
            settings.reports.mid_value_threshold,
            Decimal::new(100_050, 2)
        );
        assert_eq!(settings.reports.top_customers, 5);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.inventory.low_stock_threshold, 5);
        assert_eq!(settings.reports.top_customers, 10);
    }

    #[test]
    fn test_inconsistent_thresholds_rejected() {
        let result = parse_settings(
            r#"
            [reports]
            high_value_threshold = "100"
            mid_value_threshold = "200"
            "#,
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = load_settings("definitely/not/here/config.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
