//! Shared data types for the import pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// One cleaned spreadsheet row, ready for enrichment.
///
/// A record does not know its own position in the source sheet. Ordinals
/// are assigned by the work queue, which knows which slice of the sheet
/// the current run is processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Vendor article code, unique within one sheet
    pub code: String,
    /// Display name exactly as it appears in the sheet
    pub display_name: String,
    /// Unit price in the sheet's currency
    pub unit_price: f64,
}

impl RawRecord {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>, unit_price: f64) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            unit_price,
        }
    }
}

/// A record as written to the catalog store after enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: Uuid,
    pub code: String,
    pub display_name: String,
    pub unit_price: f64,
    /// Display name translated into the catalog language
    pub translated_name: String,
    /// Brand inferred from the name, when the model could tell one
    pub brand_guess: Option<String>,
    pub description_text: String,
    pub unit_of_measure: String,
    /// Label of the category range the record's ordinal fell into
    pub resolved_category_id: String,
    pub generated_image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Timing and usage data for one governed backend call
#[derive(Debug, Clone)]
pub struct CallMetrics {
    /// Wall-clock time from the first attempt to the success, budget
    /// waits and backoffs included
    pub duration: Duration,
    /// Number of attempts spent, including the successful one
    pub attempts: u32,
    /// Total token usage reported by the vendor, when available
    pub tokens_used: Option<u32>,
}
