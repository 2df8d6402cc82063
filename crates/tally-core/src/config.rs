//! Configuration loading
//!
//! Tally reads an optional `tally.toml`; every field has a sensible default
//! so a missing file or a partial file both work.
//!
//! ```toml
//! [service]
//! base_url = "http://localhost:3000"
//! timeout_secs = 10
//!
//! [ingestion]
//! base_url = "http://localhost:3001"
//!
//! [converter]
//! renderer = "soffice"
//! timeout_secs = 30
//!
//! [reconcile]
//! revert_policy = "retain_for_retry"
//! stale_after_secs = 120
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::reconcile::{CoordinatorOptions, RevertPolicy};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub ingestion: IngestionConfig,
    pub converter: ConverterConfig,
    pub reconcile: ReconcileConfig,
}

/// Transaction service endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Document ingestion service endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub base_url: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
        }
    }
}

/// External renderer for the document converter
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub renderer: String,
    pub timeout_secs: u64,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            renderer: crate::convert::DEFAULT_RENDERER.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Reconciliation coordinator tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub revert_policy: RevertPolicy,
    pub stale_after_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            revert_policy: RevertPolicy::default(),
            stale_after_secs: 120,
        }
    }
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Coordinator options derived from the reconcile/service sections
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            request_timeout: Duration::from_secs(self.service.timeout_secs),
            revert_policy: self.reconcile.revert_policy,
            stale_after: Duration::from_secs(self.reconcile.stale_after_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.base_url, "http://localhost:3000");
        assert_eq!(config.reconcile.revert_policy, RevertPolicy::RetainForRetry);
        assert_eq!(config.converter.renderer, "soffice");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            "[service]\nbase_url = \"http://money.local\"\n\n[reconcile]\nrevert_policy = \"discard\"\n",
        )
        .unwrap();
        assert_eq!(config.service.base_url, "http://money.local");
        assert_eq!(config.service.timeout_secs, 10);
        assert_eq!(config.reconcile.revert_policy, RevertPolicy::Discard);
        assert_eq!(config.reconcile.stale_after_secs, 120);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::parse("[service\nbase_url=").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/tally.toml")).unwrap();
        assert_eq!(config.service.timeout_secs, 10);
    }

    #[test]
    fn test_coordinator_options() {
        let config = Config::parse(
            "[service]\ntimeout_secs = 3\n\n[reconcile]\nstale_after_secs = 60\n",
        )
        .unwrap();
        let options = config.coordinator_options();
        assert_eq!(options.request_timeout, Duration::from_secs(3));
        assert_eq!(options.stale_after, Duration::from_secs(60));
    }
}
