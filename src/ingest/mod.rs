//! Sheet ingestion and row cleaning
//!
//! Supplier sheets arrive as loosely formatted exports: a header row,
//! section banners with no price, and the occasional row with a name
//! but no code. Ingestion reads the raw rows as-is and a cleaning pass
//! reduces them to the records worth enriching.

pub mod csv;

pub use csv::CsvSheetReader;

use crate::core::types::RawRecord;
use crate::utils::error::{PipelineError, Result};
use tracing::{debug, info};

/// One raw sheet row before cleaning. Fields are `None` when the cell
/// is missing, empty, or unparsable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    pub code: Option<String>,
    pub display_name: Option<String>,
    pub unit_price: Option<f64>,
}

/// Anything that can produce sheet rows
pub trait SheetSource {
    fn read_rows(&self) -> Result<Vec<SheetRow>>;
}

/// Read a source and clean its rows in one step.
///
/// A source with no rows at all points at a broken export and is an
/// error; a sheet whose rows are all cleaned away is not, and surfaces
/// later as an empty backlog.
pub fn load_backlog(source: &dyn SheetSource) -> Result<Vec<RawRecord>> {
    let rows = source.read_rows()?;
    if rows.is_empty() {
        return Err(PipelineError::ingest("the sheet source produced no rows"));
    }
    let total = rows.len();
    let records = clean_rows(rows);
    info!(
        rows = total,
        records = records.len(),
        "Cleaned the ingested sheet"
    );
    Ok(records)
}

/// Drop the header and every row that cannot become a record.
///
/// Rows with a name but no positive price are section banners in these
/// exports and are skipped, as are rows missing a name or a code. Row
/// numbers in the logs are 1-based to match what a spreadsheet shows.
pub fn clean_rows(rows: Vec<SheetRow>) -> Vec<RawRecord> {
    let mut records = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        if index == 0 {
            continue;
        }
        let row_number = index + 1;

        let Some(name) = row.display_name else {
            debug!(row = row_number, "Skipping row without a product name");
            continue;
        };
        let Some(price) = row.unit_price else {
            debug!(row = row_number, name = %name, "Skipping row without a parsable price");
            continue;
        };
        if price <= 0.0 {
            debug!(row = row_number, name = %name, "Skipping section banner row");
            continue;
        }
        let Some(code) = row.code else {
            debug!(row = row_number, name = %name, "Skipping row without a product code");
            continue;
        };

        records.push(RawRecord::new(code, name, price));
    }
    records
}
