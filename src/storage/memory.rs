//! In-memory catalog store

use super::CatalogStore;
use crate::core::types::EnrichedRecord;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Vec-backed store used by the CLI and the test suite.
///
/// Creation-time ties are resolved in favor of the record inserted
/// last, which matters to the resume scan when several records land
/// within one clock tick.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    records: RwLock<Vec<EnrichedRecord>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything inserted so far, in insertion order
    pub async fn records(&self) -> Vec<EnrichedRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert(&self, record: EnrichedRecord) -> Result<Uuid> {
        let id = record.id;
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn find_latest_by_creation_time(&self) -> Result<Option<EnrichedRecord>> {
        let records = self.records.read().await;
        // max_by_key keeps the last of equal keys
        Ok(records.iter().max_by_key(|r| r.created_at).cloned())
    }

    async fn find_by_display_name(&self, display_name: &str) -> Result<Vec<EnrichedRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.display_name == display_name)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}
