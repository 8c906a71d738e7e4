//! Catalog persistence
//!
//! The pipeline writes enriched records through the [`CatalogStore`]
//! trait. The bundled implementation keeps records in memory; a real
//! catalog database plugs in behind the same trait.

pub mod memory;

pub use memory::MemoryCatalogStore;

use crate::core::types::EnrichedRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Write and lookup access to the destination catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist one enriched record, returning its id
    async fn insert(&self, record: EnrichedRecord) -> Result<Uuid>;

    /// The most recently created record, if the catalog holds any
    async fn find_latest_by_creation_time(&self) -> Result<Option<EnrichedRecord>>;

    /// All records whose display name matches exactly
    async fn find_by_display_name(&self, display_name: &str) -> Result<Vec<EnrichedRecord>>;

    /// Number of records currently in the catalog
    async fn count(&self) -> Result<u64>;
}
