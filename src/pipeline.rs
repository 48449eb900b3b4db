// src/pipeline.rs

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use crate::{
    config::{Config, OnError},
    load::load_table,
    process::process_sheet,
    storage::{extract_year, object_path, ObjectStore},
    transfer::{download, upload, Uploaded},
    warehouse::{TableRef, Warehouse},
};

/// Tally of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub files_failed: usize,
    pub sheets_loaded: usize,
    pub sheets_failed: usize,
}

/// Expand configured inputs in order. Entries with glob metacharacters must
/// match at least one file; plain paths are taken as given.
pub fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in inputs {
        if !entry.contains(['*', '?', '[']) {
            out.push(PathBuf::from(entry));
            continue;
        }
        let mut matched: Vec<PathBuf> = glob::glob(entry)
            .with_context(|| format!("bad input pattern {:?}", entry))?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        if matched.is_empty() {
            bail!("input pattern {:?} matched no files", entry);
        }
        matched.sort();
        out.extend(matched);
    }
    Ok(out)
}

/// Apply the stage policy to a failure: abort returns the error, continue
/// logs it.
fn settle(policy: OnError, stage: &str, err: anyhow::Error) -> Result<()> {
    match policy {
        OnError::Abort => Err(err.context(format!("{} stage failed", stage))),
        OnError::Continue => {
            error!(stage, error = %format!("{:#}", err), "stage failed; continuing");
            Ok(())
        }
    }
}

/// Upload the workbook and read it back from the bucket.
async fn transfer_file(cfg: &Config, store: &dyn ObjectStore, local: &Path) -> Result<Vec<u8>> {
    let year = extract_year(local)?;
    let object = object_path(&cfg.object_template, &year);
    if upload(store, &cfg.bucket, local, &object).await? == Uploaded::KeptLocal {
        bail!(
            "gs://{}/{} not confirmed after upload of {}",
            cfg.bucket,
            object,
            local.display()
        );
    }
    download(store, &cfg.bucket, &object).await
}

/// Run every configured workbook through upload, download, per-sheet
/// cleaning and loading.
#[instrument(level = "info", skip_all, fields(bucket = %cfg.bucket))]
pub async fn run(
    cfg: &Config,
    store: &dyn ObjectStore,
    warehouse: &dyn Warehouse,
) -> Result<RunSummary> {
    let inputs = expand_inputs(&cfg.inputs)?;
    let targets = cfg
        .sheets
        .iter()
        .map(|t| -> Result<_> { Ok((t, t.table.parse::<TableRef>()?)) })
        .collect::<Result<Vec<_>>>()?;
    let mut summary = RunSummary::default();

    for local in &inputs {
        summary.files += 1;
        info!(file = %local.display(), "processing workbook");

        let data = match transfer_file(cfg, store, local).await {
            Ok(data) => data,
            Err(e) => {
                summary.files_failed += 1;
                settle(cfg.policy.transfer, "transfer", e)?;
                continue;
            }
        };

        for (target, table) in &targets {
            let batch = match process_sheet(&data, warehouse, target, cfg).await {
                Ok(batch) => batch,
                Err(e) => {
                    summary.sheets_failed += 1;
                    settle(cfg.policy.process, "process", e)?;
                    continue;
                }
            };

            match load_table(warehouse, &batch, table).await {
                Ok(()) => summary.sheets_loaded += 1,
                Err(e) => {
                    summary.sheets_failed += 1;
                    settle(cfg.policy.load, "load", e)?;
                }
            }
        }
    }

    info!(
        files = summary.files,
        files_failed = summary.files_failed,
        sheets_loaded = summary.sheets_loaded,
        sheets_failed = summary.sheets_failed,
        "run finished"
    );
    Ok(summary)
}
