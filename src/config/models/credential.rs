//! Credential configuration models

use crate::utils::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Billing tier of a credential.
///
/// The tier drives how aggressively the pool converts pooled request
/// budgets into concurrent workers: free tiers throttle hard and punish
/// bursts, paid tiers tolerate sustained traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialTier {
    #[default]
    Free,
    Paid,
}

/// Feature switches for one credential's model endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCapabilities {
    /// Endpoint honors a JSON response-format request
    #[serde(default = "default_true")]
    pub structured_output: bool,
    /// Endpoint accepts a dedicated system instruction field
    #[serde(default = "default_true")]
    pub system_instruction: bool,
}

impl Default for CredentialCapabilities {
    fn default() -> Self {
        Self {
            structured_output: true,
            system_instruction: true,
        }
    }
}

/// One pooled API credential as declared in the YAML config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Name used in logs and usage reports
    pub name: String,
    /// API key, either a literal value or an `${ENV_VAR}` reference
    pub secret: String,
    /// Base URL of the vendor API
    pub endpoint: String,
    /// Model identifier to call
    pub model_id: String,
    /// Requests allowed per rolling window
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default)]
    pub capabilities: CredentialCapabilities,
    #[serde(default)]
    pub tier: CredentialTier,
}

fn default_true() -> bool {
    true
}

fn default_requests_per_minute() -> u32 {
    10
}

impl CredentialConfig {
    /// Expand an `${ENV_VAR}` secret reference from the process environment.
    ///
    /// Literal secrets are left untouched.
    pub fn resolve_secret(&mut self) -> Result<()> {
        if let Some(var) = self
            .secret
            .strip_prefix("${")
            .and_then(|s| s.strip_suffix('}'))
        {
            self.secret = std::env::var(var).map_err(|_| {
                PipelineError::config(format!(
                    "credential '{}': environment variable {} is not set",
                    self.name, var
                ))
            })?;
        }
        Ok(())
    }
}
