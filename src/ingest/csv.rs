//! CSV sheet reader
//!
//! Reads exports with the layout `code, display_name, unit_price`.
//! Parsing is deliberately permissive: short rows are allowed, cells
//! are trimmed, and prices accept a comma decimal separator. Anything
//! that still fails becomes a `None` cell for the cleaning pass to
//! judge.

use super::{SheetRow, SheetSource};
use crate::utils::error::Result;
use csv::ReaderBuilder;
use std::path::PathBuf;

pub struct CsvSheetReader {
    path: PathBuf,
}

impl CsvSheetReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SheetSource for CsvSheetReader {
    fn read_rows(&self) -> Result<Vec<SheetRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(SheetRow {
                code: field(&record, 0),
                display_name: field(&record, 1),
                unit_price: field(&record, 2)
                    .and_then(|raw| raw.replace(',', ".").parse().ok()),
            });
        }
        Ok(rows)
    }
}

fn field(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
}
