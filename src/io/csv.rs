//! CSV ingestion for the per-catchment floodplain table.
//!
//! The floodplain metrics are computed upstream (zonal statistics over a
//! landcover raster) and delivered as a small CSV keyed by catchment
//! NHDPlusID. Rows are deserialized with Serde; errors are annotated with
//! row numbers for easier debugging.

use crate::flowline::FlowlineId;
use crate::stats::{FloodplainRow, FloodplainTable};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRow {
    catchment_id: u64,
    natural_m2: f64,
    total_m2: f64,
}

/// Read a floodplain table from a headered CSV with columns
/// `catchment_id, natural_m2, total_m2`.
///
/// Duplicate catchment ids keep the last row, matching a plain left-join.
///
/// # Errors
/// Returns an error if the file cannot be opened or any row fails to
/// deserialize.
pub fn read_floodplain_csv(path: impl AsRef<Path>) -> Result<FloodplainTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let mut table = FloodplainTable::new();
    for (i, rec) in reader.deserialize::<CsvRow>().enumerate() {
        let row = rec.with_context(|| format!("parse CSV record #{}", i + 1))?;
        table.insert(
            FlowlineId::new(row.catchment_id),
            FloodplainRow {
                natural_m2: row.natural_m2,
                total_m2: row.total_m2,
            },
        );
    }
    Ok(table)
}
