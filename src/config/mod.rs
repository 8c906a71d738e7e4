//! Configuration management for the importer
//!
//! This module handles loading and validation of the importer's YAML
//! configuration: the credential pool, pipeline tuning, backend HTTP
//! settings, and the category taxonomy.

pub mod models;
pub mod validation;

pub use models::{
    BackendConfig, CategoryRange, CredentialCapabilities, CredentialConfig, CredentialTier,
    PipelineConfig, RetryConfig, WorkerLimits,
};
pub use validation::Validate;

use crate::utils::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the importer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pooled credentials, assigned to workers by index
    pub credentials: Vec<CredentialConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    /// Ordinal intervals mapping sheet rows to catalog categories
    pub taxonomy: Vec<CategoryRange>,
}

impl Config {
    /// Load and validate configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;

        debug!(
            credentials = config.credentials.len(),
            ranges = config.taxonomy.len(),
            "Configuration loaded successfully"
        );
        Ok(config)
    }

    /// Parse configuration from a YAML string and resolve secret references.
    ///
    /// Validation is left to the caller so partial configs can be built
    /// up programmatically.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| PipelineError::config(format!("Failed to parse config: {}", e)))?;

        for credential in &mut config.credentials {
            credential.resolve_secret()?;
        }
        Ok(config)
    }
}
