// src/transfer.rs

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::storage::ObjectStore;

/// What happened to the local copy after an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uploaded {
    /// Remote object confirmed, local file deleted.
    Removed,
    /// Remote object could not be confirmed, local file left in place.
    KeptLocal,
}

/// Copy `local` to `bucket/object` and delete `local` once the object is
/// confirmed to exist.
#[instrument(level = "info", skip(store), fields(local = %local.display()))]
pub async fn upload(
    store: &dyn ObjectStore,
    bucket: &str,
    local: &Path,
    object: &str,
) -> Result<Uploaded> {
    let data = fs::read(local)
        .await
        .with_context(|| format!("reading {}", local.display()))?;
    let bytes = data.len();

    store.put(bucket, object, data).await?;

    if store.exists(bucket, object).await? {
        fs::remove_file(local)
            .await
            .with_context(|| format!("removing {}", local.display()))?;
        info!(bytes, "uploaded to gs://{}/{} and removed local copy", bucket, object);
        Ok(Uploaded::Removed)
    } else {
        warn!(
            "gs://{}/{} not found after upload; keeping {}",
            bucket,
            object,
            local.display()
        );
        Ok(Uploaded::KeptLocal)
    }
}

/// Fetch the whole object into memory.
#[instrument(level = "info", skip(store))]
pub async fn download(store: &dyn ObjectStore, bucket: &str, object: &str) -> Result<Vec<u8>> {
    let data = store.get(bucket, object).await?;
    info!(bytes = data.len(), "downloaded gs://{}/{}", bucket, object);
    Ok(data)
}
