//! Enrichment backend abstraction
//!
//! The pipeline talks to the text-generation vendor through the
//! [`EnrichmentBackend`] trait. The HTTP implementation lives in
//! [`http`]; prompt construction and response decoding in [`prompt`].

pub mod http;
pub mod prompt;

pub use http::HttpEnrichmentBackend;
pub use prompt::{EnrichmentFields, build_prompt, decode_fields};

use crate::config::models::CredentialConfig;
use crate::core::types::CallMetrics;
use crate::utils::error::BackendError;
use async_trait::async_trait;

/// What the worker wants from the model, before capability adaptation
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentPrompt {
    /// Standing instruction describing the enrichment task
    pub instruction: String,
    /// Record-specific request text
    pub user_content: String,
    /// Ask the vendor for a JSON-typed response
    pub structured_output: bool,
}

/// Vendor-ready payload, shaped to one credential's capabilities
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRequest {
    /// Dedicated system instruction, when the endpoint supports one
    pub instruction: Option<String>,
    pub user_content: String,
    pub structured_output: bool,
}

/// Raw vendor response
#[derive(Debug, Clone, Default)]
pub struct EnrichmentResponse {
    pub text: String,
    pub image_urls: Vec<String>,
    pub tokens_used: Option<u32>,
}

/// A successful governed call: the response plus timing metrics
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub response: EnrichmentResponse,
    pub metrics: CallMetrics,
}

/// A text-generation vendor the governor can call
#[async_trait]
pub trait EnrichmentBackend: Send + Sync {
    /// Issue one enrichment call with the given credential
    async fn generate(
        &self,
        credential: &CredentialConfig,
        request: EnrichmentRequest,
    ) -> std::result::Result<EnrichmentResponse, BackendError>;

    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;
}
