// src/warehouse/mod.rs

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::{fmt, str::FromStr};

pub mod bigquery;

pub use bigquery::BigQueryWarehouse;

/// Fully qualified `project.dataset.table` id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl FromStr for TableRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        match parts.as_slice() {
            [project, dataset, table]
                if !project.is_empty() && !dataset.is_empty() && !table.is_empty() =>
            {
                Ok(Self {
                    project: project.to_string(),
                    dataset: dataset.to_string(),
                    table: table.to_string(),
                })
            }
            _ => bail!("table id {:?} is not of the form project.dataset.table", s),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// The analytical warehouse operations the job needs.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Column names of `table`, in table order.
    async fn schema(&self, table: &TableRef) -> Result<Vec<String>>;

    /// Append CSV rows (first line is a header) to `table` and wait for the
    /// load to finish.
    async fn load_append(&self, table: &TableRef, csv: Vec<u8>) -> Result<()>;
}
