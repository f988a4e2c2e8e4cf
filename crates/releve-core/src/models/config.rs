//! Configuration structures for the statement pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the releve pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleveConfig {
    /// Statement parsing configuration.
    pub parse: ParseConfig,

    /// Portal download configuration.
    pub portal: PortalConfig,

    /// Persistence configuration.
    pub store: StoreConfig,
}

impl Default for ReleveConfig {
    fn default() -> Self {
        Self {
            parse: ParseConfig::default(),
            portal: PortalConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Statement parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Absolute tolerance for balance comparisons, in currency units.
    pub balance_tolerance: f64,

    /// Maximum trailing numbers trusted on a product sub-line; earlier
    /// numbers are treated as part of the product description.
    pub max_product_numbers: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: 0.01,
            max_product_numbers: 5,
        }
    }
}

/// Portal download configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Base URL of the portal API.
    pub base_url: String,

    /// First day of the statement date range.
    pub start_date: String,

    /// Number of concurrent downloads.
    pub workers: usize,

    /// Retry attempts per client after the first failure.
    pub max_retries: u32,

    /// Initial retry delay in seconds; doubled per attempt.
    pub retry_base_secs: u64,

    /// Wall-clock budget for a full batch, in seconds.
    pub budget_secs: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.pharma.sobrus.com".to_string(),
            start_date: "2017-01-01".to_string(),
            workers: 10,
            max_retries: 3,
            retry_base_secs: 5,
            budget_secs: 600,
            request_timeout_secs: 30,
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("releve.db"),
        }
    }
}

impl ReleveConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
