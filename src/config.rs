// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::warehouse::TableRef;

/// What the driver does when a stage fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    Abort,
    Continue,
}

/// Per-stage failure handling.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct FaultPolicy {
    /// Upload and download.
    pub transfer: OnError,
    /// Sheet parsing, schema fetch and cleaning.
    pub process: OnError,
    /// Load job submission.
    pub load: OnError,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            transfer: OnError::Abort,
            process: OnError::Continue,
            load: OnError::Continue,
        }
    }
}

/// Column names that get a fixed coercion rule. Anything not listed keeps
/// the type inferred from the sheet.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ColumnRules {
    pub dates: Vec<String>,
    pub floats: Vec<String>,
    pub integers: Vec<String>,
    pub text: Vec<String>,
}

impl Default for ColumnRules {
    fn default() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        Self {
            dates: owned(&["Fecha", "Fechadevenc", "Fecha_de_venc"]),
            floats: owned(&[
                "Valor_Unitario",
                "Costo_Unitario",
                "SubTotal",
                "Descuento",
                "Total",
                "Anticipo",
                "Saldo",
                "Retenciones",
            ]),
            integers: owned(&["Cantidad"]),
            text: owned(&["No_orden_de_compra"]),
        }
    }
}

/// One sheet of every input workbook and the table it is appended to.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    pub sheet: String,
    pub table: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub credentials: Option<PathBuf>,
    pub log_file: PathBuf,
    pub bucket: String,
    pub object_template: String,
    pub inputs: Vec<String>,
    pub sheets: Vec<SheetTarget>,
    pub skip_rows: usize,
    pub debug_dir: Option<PathBuf>,
    pub staging_prefix: String,
    pub poll_interval_ms: u64,
    pub columns: ColumnRules,
    pub policy: FaultPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: None,
            log_file: PathBuf::from("procesamiento_tarea.log"),
            bucket: String::new(),
            object_template: "ReportesAliaddo/Reporte_Venta_Detallado_{year}.xlsx".into(),
            inputs: Vec::new(),
            sheets: vec![
                SheetTarget {
                    sheet: "Reporte".into(),
                    table: "valetdata.AliaddoData.TblVenta".into(),
                },
                SheetTarget {
                    sheet: "Reporte_Detalle".into(),
                    table: "valetdata.AliaddoData.TblVentaDetalle".into(),
                },
            ],
            skip_rows: 3,
            debug_dir: None,
            staging_prefix: "ReportesAliaddo/_staging".into(),
            poll_interval_ms: 2000,
            columns: ColumnRules::default(),
            policy: FaultPolicy::default(),
        }
    }
}

impl Config {
    /// Read and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = Self::from_yaml(&raw).with_context(|| format!("in config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw).context("parsing YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            bail!("`bucket` must be set");
        }
        if self.inputs.is_empty() {
            bail!("`inputs` lists no files");
        }
        if self.sheets.is_empty() {
            bail!("`sheets` lists no sheet/table pairs");
        }
        if !self.object_template.contains("{year}") {
            bail!(
                "`object_template` {:?} has no {{year}} placeholder",
                self.object_template
            );
        }
        if self.poll_interval_ms == 0 {
            bail!("`poll_interval_ms` must be greater than zero");
        }
        for target in &self.sheets {
            target
                .table
                .parse::<TableRef>()
                .with_context(|| format!("sheet {:?}", target.sheet))?;
        }
        Ok(())
    }
}
