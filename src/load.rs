// src/load.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::{
    process::write_csv,
    warehouse::{TableRef, Warehouse},
};

/// Serialize `batch` to a scratch CSV and append it to `table`. The scratch
/// file is removed when this returns, whatever the outcome.
#[instrument(level = "info", skip(warehouse, batch), fields(table = %table, rows = batch.num_rows()))]
pub async fn load_table(
    warehouse: &dyn Warehouse,
    batch: &RecordBatch,
    table: &TableRef,
) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("ventas-load-")
        .suffix(".csv")
        .tempfile()
        .context("creating temporary CSV")?;
    write_scratch(&scratch, batch)?;
    debug!(path = %scratch.path().display(), "wrote temporary CSV");

    let csv = tokio::fs::read(scratch.path())
        .await
        .with_context(|| format!("reading {}", scratch.path().display()))?;
    warehouse
        .load_append(table, csv)
        .await
        .with_context(|| format!("loading into {}", table))?;

    info!("loaded into {}", table);
    Ok(())
}

fn write_scratch(scratch: &NamedTempFile, batch: &RecordBatch) -> Result<()> {
    write_csv(batch, BufWriter::new(scratch.as_file()))?
        .flush()
        .context("flushing temporary CSV")
}
