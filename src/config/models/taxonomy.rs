//! Category taxonomy models

use serde::{Deserialize, Serialize};

/// One ordinal interval mapping sheet rows to a catalog category.
///
/// Bounds are inclusive, 1-based sheet ordinals with the header row
/// excluded. Ranges are allowed to overlap; nesting a narrower range
/// inside a wider one forms an implicit tree, and the classifier picks
/// the most specific match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRange {
    /// Catalog category identifier
    pub label: String,
    pub start: usize,
    pub end: usize,
    /// Enclosing category, when this range refines a wider one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_label: Option<String>,
}

impl CategoryRange {
    pub fn new(label: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            parent_label: None,
        }
    }

    pub fn with_parent(
        label: impl Into<String>,
        start: usize,
        end: usize,
        parent: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            parent_label: Some(parent.into()),
        }
    }

    /// Inclusive width of the interval
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        ordinal >= self.start && ordinal <= self.end
    }
}
