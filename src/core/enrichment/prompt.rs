//! Prompt construction and response decoding

use super::EnrichmentPrompt;
use crate::core::types::RawRecord;
use crate::utils::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Standing instruction sent with every enrichment request
const TASK_INSTRUCTION: &str = "You are a product catalog enrichment assistant. \
For the given product, respond with a JSON object containing exactly these fields: \
\"translated_name\" (the product name translated into English, cleaned of vendor shorthand), \
\"brand\" (the brand name, or null when the name does not reveal one), \
\"description\" (one or two customer-facing sentences describing the product), \
\"unit_of_measure\" (how the product is sold: piece, kg, liter, pack, bottle, or similar). \
Respond with only the JSON object.";

/// Appended to the user content when an endpoint cannot honor a
/// structured-output request
pub const JSON_FALLBACK_INSTRUCTION: &str =
    "Respond with a single JSON object and no surrounding prose.";

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("Invalid fenced JSON regex")
});

/// Fields the model is asked to produce for every record
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnrichmentFields {
    pub translated_name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_unit")]
    pub unit_of_measure: String,
}

fn default_unit() -> String {
    "piece".to_string()
}

/// Build the enrichment prompt for one classified record
pub fn build_prompt(record: &RawRecord, category_label: &str) -> EnrichmentPrompt {
    EnrichmentPrompt {
        instruction: TASK_INSTRUCTION.to_string(),
        user_content: format!(
            "Product name: {}\nArticle code: {}\nUnit price: {:.2}\nCatalog category: {}",
            record.display_name, record.code, record.unit_price, category_label
        ),
        structured_output: true,
    }
}

/// Decode the model's answer into enrichment fields.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence,
/// which models produce even when told not to. Anything else is a
/// decode failure for the record.
pub fn decode_fields(text: &str) -> Result<EnrichmentFields> {
    let trimmed = text.trim();
    if let Ok(fields) = serde_json::from_str::<EnrichmentFields>(trimmed) {
        return Ok(fields);
    }
    if let Some(captures) = FENCED_JSON.captures(trimmed) {
        if let Some(body) = captures.get(1) {
            if let Ok(fields) = serde_json::from_str::<EnrichmentFields>(body.as_str()) {
                return Ok(fields);
            }
        }
    }
    Err(PipelineError::ResponseDecode(format!(
        "expected a JSON object with enrichment fields, got: {}",
        preview(trimmed)
    )))
}

/// First 120 characters of the offending text, for error messages
fn preview(text: &str) -> String {
    if text.chars().count() <= 120 {
        text.to_string()
    } else {
        let head: String = text.chars().take(120).collect();
        format!("{}...", head)
    }
}
