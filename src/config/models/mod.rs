//! Configuration data models

pub mod credential;
pub mod pipeline;
pub mod taxonomy;

pub use credential::{CredentialCapabilities, CredentialConfig, CredentialTier};
pub use pipeline::{BackendConfig, PipelineConfig, RetryConfig, WorkerLimits};
pub use taxonomy::CategoryRange;
