// src/export.rs

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{fs::File, io::Write, path::Path};
use tracing::info;

use crate::record::{RequisitionRecord, MONTH_YEAR};

pub const EXPORT_FILE_NAME: &str = "supply_chain_data.csv";

/// Source columns plus the derived month column, unless the source
/// already had one.
pub fn export_columns(source_columns: &[String]) -> Vec<String> {
    let mut cols = source_columns.to_vec();
    if !cols.iter().any(|c| c == MONTH_YEAR) {
        cols.push(MONTH_YEAR.to_string());
    }
    cols
}

/// Write `records` as CSV with a header row.
pub fn write_csv<W: Write>(
    source_columns: &[String],
    records: &[&RequisitionRecord],
    writer: W,
) -> Result<()> {
    let columns = export_columns(source_columns);
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(&columns).context("writing CSV header")?;
    for r in records {
        wtr.write_record(columns.iter().map(|c| r.cell(c)))
            .context("writing CSV row")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

/// UTF-8 CSV bytes, ready to hand out as a download.
pub fn to_csv_bytes(source_columns: &[String], records: &[&RequisitionRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(source_columns, records, &mut buf)?;
    Ok(buf)
}

pub fn export_to_path(
    source_columns: &[String],
    records: &[&RequisitionRecord],
    path: &Path,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating export file {}", path.display()))?;
    write_csv(source_columns, records, file)?;
    info!(rows = records.len(), path = %path.display(), "exported filtered view");
    Ok(())
}
