// src/storage/mod.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub mod gcs;

pub use gcs::GcsStore;

/// The object-storage operations the job needs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, bucket: &str, path: &str, data: Vec<u8>) -> Result<()>;
    async fn exists(&self, bucket: &str, path: &str) -> Result<bool>;
    async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>>;
    async fn delete(&self, bucket: &str, path: &str) -> Result<()>;
}

// Four digits closing the file stem, not part of a longer number.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\D)(\d{4})$").unwrap());

/// Pull the report year out of a file name such as
/// `Reporte_Venta_Detallado_2024.xlsx`.
pub fn extract_year<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .ok_or_else(|| anyhow!("no file name in {}", path.display()))?;

    YEAR_RE
        .captures(&stem)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            anyhow!(
                "file name {:?} does not end in a 4-digit year (expected e.g. Reporte_2024.xlsx)",
                path.display().to_string()
            )
        })
}

/// Destination object for a given year.
pub fn object_path(template: &str, year: &str) -> String {
    template.replace("{year}", year)
}
