// src/process/mod.rs
use anyhow::{Context, Result};
use arrow::{
    array::BooleanArray, compute::filter_record_batch, csv::WriterBuilder,
    record_batch::RecordBatch,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{ColumnRules, Config, SheetTarget},
    warehouse::{TableRef, Warehouse},
};

pub mod convert;
pub mod date_parser;
pub mod raw_table;
pub mod schema;
pub mod trimming;
pub mod utils;

pub use raw_table::{read_sheet, RawTable};

/// Turn a raw sheet into a batch shaped like the destination table:
/// reindexed to `target_columns`, coerced per `rules`, line breaks
/// scrubbed, blank rows removed.
pub fn clean(raw: &RawTable, target_columns: &[String], rules: &ColumnRules) -> Result<RecordBatch> {
    let aligned = schema::reindex(raw, target_columns);
    // judged before coercion fills blanks with 0 / ""
    let keep = BooleanArray::from(aligned.non_blank_rows());

    let typed = convert::convert_to_final_types(&aligned, rules)
        .context("failed to convert to final types")?;
    let scrubbed = trimming::apply_newline_scrub(&typed).context("failed to scrub newlines")?;
    let kept = filter_record_batch(&scrubbed, &keep).context("dropping blank rows")?;

    debug!(
        rows_in = aligned.num_rows,
        rows_out = kept.num_rows(),
        "cleaned sheet"
    );
    Ok(kept)
}

/// Read one sheet out of the workbook bytes and clean it against the live
/// schema of its destination table.
#[instrument(level = "info", skip(data, warehouse, cfg), fields(sheet = %target.sheet, table = %target.table))]
pub async fn process_sheet(
    data: &[u8],
    warehouse: &dyn Warehouse,
    target: &SheetTarget,
    cfg: &Config,
) -> Result<RecordBatch> {
    let table: TableRef = target.table.parse()?;
    let raw = read_sheet(data, &target.sheet, cfg.skip_rows)?;
    let columns = warehouse
        .schema(&table)
        .await
        .with_context(|| format!("fetching schema of {}", table))?;

    let batch = clean(&raw, &columns, &cfg.columns)?;

    if let Some(dir) = &cfg.debug_dir {
        match write_debug(dir, &target.sheet, &batch) {
            Ok(path) => info!(path = %path.display(), "wrote debug copy"),
            Err(e) => warn!(error = %e, "could not write debug copy"),
        }
    }

    info!(rows = batch.num_rows(), "sheet processed");
    Ok(batch)
}

/// Write `batch` as CSV with a header row.
pub fn write_csv<W: Write>(batch: &RecordBatch, out: W) -> Result<W> {
    let mut writer = WriterBuilder::new().with_header(true).build(out);
    writer.write(batch).context("writing CSV rows")?;
    Ok(writer.into_inner())
}

/// `{dir}/debug_{sheet}.csv`, replaced on every run.
pub fn write_debug(dir: &Path, sheet: &str, batch: &RecordBatch) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(format!("debug_{}.csv", sheet));
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(batch, BufWriter::new(file))?
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(path)
}
