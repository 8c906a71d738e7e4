//! Ordinal-interval category classifier

use crate::config::models::CategoryRange;

/// Interval table resolving sheet ordinals to catalog categories.
///
/// Ranges may overlap; the most specific (narrowest) containing range
/// wins, and ties keep the earliest declaration. An ordinal outside
/// every range resolves to nothing, which the caller must treat as a
/// per-record failure. There is no default category.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    ranges: Vec<CategoryRange>,
}

impl CategoryTable {
    pub fn new(ranges: Vec<CategoryRange>) -> Self {
        Self { ranges }
    }

    /// The most specific range containing `ordinal`, if any
    pub fn resolve(&self, ordinal: usize) -> Option<&CategoryRange> {
        let mut best: Option<&CategoryRange> = None;
        for range in &self.ranges {
            if !range.contains(ordinal) {
                continue;
            }
            match best {
                // strict comparison keeps the earlier of two equal spans
                Some(current) if range.span() >= current.span() => {}
                _ => best = Some(range),
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
