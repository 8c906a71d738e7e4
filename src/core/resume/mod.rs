//! Resume point discovery
//!
//! A rerun of the same backlog should not re-enrich records that were
//! already persisted. The planner asks the store for the most recently
//! created record and locates it in the incoming backlog by display
//! name; everything up to and including that position is considered
//! done.

use crate::core::types::RawRecord;
use crate::storage::CatalogStore;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Locates how far a previous run got through the current backlog
pub struct ResumePlanner {
    store: Arc<dyn CatalogStore>,
}

impl ResumePlanner {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Ordinal of the last record a previous run persisted, or `None`
    /// when the whole backlog still needs processing.
    ///
    /// The match is by exact display name against the most recently
    /// created stored record. When the backlog repeats a name, the
    /// earliest occurrence wins, which resumes conservatively: later
    /// duplicates are enriched again rather than skipped.
    pub async fn find_resume_ordinal(&self, backlog: &[RawRecord]) -> Result<Option<usize>> {
        let Some(latest) = self.store.find_latest_by_creation_time().await? else {
            debug!("Store is empty, starting from the top");
            return Ok(None);
        };

        match backlog
            .iter()
            .position(|record| record.display_name == latest.display_name)
        {
            Some(index) => {
                let ordinal = index + 1;
                info!(
                    record = %latest.display_name,
                    ordinal,
                    "Found resume point from a previous run"
                );
                Ok(Some(ordinal))
            }
            None => {
                warn!(
                    record = %latest.display_name,
                    "Last persisted record is not in this backlog, starting from the top"
                );
                Ok(None)
            }
        }
    }
}
