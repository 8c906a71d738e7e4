//! # Catalog Forge
//!
//! A concurrent, rate-limited enrichment pipeline for supplier catalogs.
//! Reads spreadsheet product rows, classifies each record into a category
//! by its sheet position, enriches it through pooled LLM credentials, and
//! persists the result exactly once.
//!
//! ## Features
//!
//! - **Ordinal Classification**: records map to categories through an
//!   interval table keyed on sheet position
//! - **Pooled Credentials**: workers share a fixed pool of API credentials,
//!   each with its own per-minute budget
//! - **Rate Governance**: rolling-window budgets with exponential backoff,
//!   so vendor limits are respected instead of discovered
//! - **Resumable Runs**: a rerun picks up after the last persisted record
//! - **Circuit Breaking**: a systemic outage cancels the run instead of
//!   burning budget on records that will only fail
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_forge::ingest::load_backlog;
//! use catalog_forge::{
//!     Config, CsvSheetReader, HttpEnrichmentBackend, MemoryCatalogStore, Pipeline,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/importer.yaml").await?;
//!     let backlog = load_backlog(&CsvSheetReader::new("data/products.csv"))?;
//!
//!     let backend = Arc::new(HttpEnrichmentBackend::new(&config.backend)?);
//!     let store = Arc::new(MemoryCatalogStore::new());
//!     let pipeline = Pipeline::new(&config, backend, store)?;
//!
//!     let summary = pipeline.run(backlog).await?;
//!     println!("imported {} records", summary.imported);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

// Public module exports
pub mod config;
pub mod core;
pub mod ingest;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use config::models::{
    BackendConfig, CategoryRange, CredentialCapabilities, CredentialConfig, CredentialTier,
    PipelineConfig, RetryConfig, WorkerLimits,
};
pub use utils::error::{BackendError, PipelineError, Result};

// Export the pipeline stages
pub use core::classifier::CategoryTable;
pub use core::enrichment::{
    EnrichmentBackend, EnrichmentPrompt, EnrichmentRequest, EnrichmentResponse, EnrichmentResult,
    HttpEnrichmentBackend,
};
pub use core::governor::RateLimitGovernor;
pub use core::orchestrator::{ImportSummary, Orchestrator, RunSettings};
pub use core::pool::{CredentialPool, CredentialUsageSnapshot};
pub use core::queue::{WorkItem, WorkQueue};
pub use core::resume::ResumePlanner;
pub use core::types::{CallMetrics, EnrichedRecord, RawRecord};
pub use core::worker::{WorkerRegistry, WorkerState, WorkerStatus};

// Export ingestion and storage
pub use ingest::{CsvSheetReader, SheetRow, SheetSource};
pub use storage::{CatalogStore, MemoryCatalogStore};

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The assembled import pipeline
pub struct Pipeline {
    orchestrator: Orchestrator,
}

impl Pipeline {
    /// Wire a pipeline from configuration, an enrichment backend, and a
    /// store
    pub fn new(
        config: &Config,
        backend: Arc<dyn EnrichmentBackend>,
        store: Arc<dyn CatalogStore>,
    ) -> Result<Self> {
        info!(
            credentials = config.credentials.len(),
            ranges = config.taxonomy.len(),
            backend = backend.name(),
            "Assembling pipeline"
        );

        let pool = Arc::new(CredentialPool::new(config.credentials.clone())?);
        let governor = Arc::new(RateLimitGovernor::with_window(
            pool,
            backend,
            config.pipeline.retry.clone(),
            Duration::from_secs(config.pipeline.rate_window_secs),
        ));
        let classifier = Arc::new(CategoryTable::new(config.taxonomy.clone()));
        let settings = RunSettings::from_pipeline(&config.pipeline);

        Ok(Self {
            orchestrator: Orchestrator::new(governor, classifier, store, settings),
        })
    }

    /// Run the pipeline over a cleaned backlog
    pub async fn run(&self, backlog: Vec<RawRecord>) -> Result<ImportSummary> {
        self.orchestrator.run(backlog).await
    }

    /// Live worker states, for progress reporting
    pub fn registry(&self) -> &WorkerRegistry {
        self.orchestrator.registry()
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
