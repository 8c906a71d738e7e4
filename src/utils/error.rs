//! Error types for the importer

use thiserror::Error;

/// Result type alias for the importer
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors surfaced by an enrichment backend call.
///
/// Every non-success vendor response is folded into one of these four
/// variants so the governor can decide how to retry and what to record
/// against the owning credential.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The credential was rejected by the vendor
    #[error("Authentication failed for {backend}: {message}")]
    Auth {
        backend: &'static str,
        message: String,
    },

    /// Vendor-side rate limit, distinct from the local per-minute budget
    #[error("Rate limit exceeded for {backend}: {message}")]
    RateLimited {
        backend: &'static str,
        message: String,
        retry_after: Option<u64>,
    },

    /// The vendor rejected the request payload
    #[error("Malformed request for {backend}: {message}")]
    MalformedRequest {
        backend: &'static str,
        message: String,
    },

    /// Network trouble or a vendor-side hiccup
    #[error("Transient error for {backend}: {message}")]
    Transient {
        backend: &'static str,
        message: String,
    },
}

impl BackendError {
    /// Create an authentication error
    pub fn auth(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Auth {
            backend,
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(backend: &'static str, retry_after: Option<u64>) -> Self {
        Self::RateLimited {
            backend,
            message: match retry_after {
                Some(seconds) => format!("retry after {} seconds", seconds),
                None => "no retry hint given".to_string(),
            },
            retry_after,
        }
    }

    /// Create a malformed request error
    pub fn malformed_request(backend: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            backend,
            message: message.into(),
        }
    }

    /// Create a transient error
    pub fn transient(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Transient {
            backend,
            message: message.into(),
        }
    }

    /// Name of the backend that produced this error
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Auth { backend, .. }
            | Self::RateLimited { backend, .. }
            | Self::MalformedRequest { backend, .. }
            | Self::Transient { backend, .. } => backend,
        }
    }

    /// Whether this error came from a vendor rate limit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Vendor retry hint in seconds, when one was supplied
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Short lowercase tag used in log fields and error summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::MalformedRequest { .. } => "malformed_request",
            Self::Transient { .. } => "transient",
        }
    }
}

/// Main error type for the importer
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spreadsheet ingest errors
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No category range contains the record's ordinal
    #[error("No category range contains ordinal {ordinal} for record '{name}'")]
    Classification { name: String, ordinal: usize },

    /// Enrichment call failed after all retries
    #[error("Enrichment error: {0}")]
    Enrichment(#[from] BackendError),

    /// The backend answered, but not with fields we can use
    #[error("Enrichment response could not be decoded: {0}")]
    ResponseDecode(String),

    /// Catalog store errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Worker loop exceeded its allotted wall time
    #[error("Worker {worker_id} timed out after {elapsed_secs}s")]
    WorkerTimeout {
        worker_id: usize,
        elapsed_secs: u64,
    },

    /// Worker loop observed cancellation and unwound
    #[error("Worker {0} was cancelled")]
    WorkerCancelled(usize),

    /// Too many worker loops died and the run was halted
    #[error("Circuit breaker tripped: {failed} of {total} workers failed")]
    CircuitBreaker { failed: usize, total: usize },

    /// Nothing survived ingest cleaning
    #[error("Nothing to import: the cleaned backlog is empty")]
    EmptyBacklog,

    /// The credential pool has no members
    #[error("No credentials configured")]
    NoCredentials,
}

impl PipelineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an ingest error
    pub fn ingest(message: impl Into<String>) -> Self {
        Self::Ingest(message.into())
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create a classification failure for a single record
    pub fn classification(name: impl Into<String>, ordinal: usize) -> Self {
        Self::Classification {
            name: name.into(),
            ordinal,
        }
    }
}
