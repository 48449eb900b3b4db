//! In-memory collaborators and workbook fixtures shared by the unit tests.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::{Cursor, Write},
    sync::Mutex,
};
use zip::{write::SimpleFileOptions, CompressionMethod};

use crate::{
    storage::ObjectStore,
    warehouse::{TableRef, Warehouse},
};

/// Fixture cell.
#[derive(Debug, Clone, Copy)]
pub enum Cell {
    S(&'static str),
    N(f64),
    E,
}

fn column_letters(mut idx: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        if row.iter().all(|c| matches!(c, Cell::E)) {
            continue;
        }
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let at = format!("{}{}", column_letters(c), r + 1);
            match cell {
                Cell::S(s) => xml.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    at,
                    escape(s)
                )),
                Cell::N(n) => xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, at, n)),
                Cell::E => {}
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Build a minimal `.xlsx` with the given sheets.
pub fn xlsx(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let mut types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
        );
        let mut book = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, (name, _)) in sheets.iter().enumerate() {
            let n = i + 1;
            types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                n
            ));
            book.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                n,
                n
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
        }
        types.push_str("</Types>");
        book.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(types.as_bytes())?;
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        )?;
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(book.as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(rels.as_bytes())?;
        for (i, (_, rows)) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(sheet_xml(rows).as_bytes())?;
        }
        zip.finish()?;
    }
    Ok(buf)
}

/// Object store kept in a map.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    /// Accept uploads without keeping them.
    pub lose_uploads: bool,
    pub fail_puts: bool,
}

impl MemoryStore {
    pub fn key(bucket: &str, path: &str) -> String {
        format!("{}/{}", bucket, path)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, bucket: &str, path: &str, data: Vec<u8>) -> Result<()> {
        if self.fail_puts {
            bail!("connection reset uploading {}", path);
        }
        if !self.lose_uploads {
            self.objects
                .lock()
                .unwrap()
                .insert(Self::key(bucket, path), data);
        }
        Ok(())
    }

    async fn exists(&self, bucket: &str, path: &str) -> Result<bool> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(&Self::key(bucket, path)))
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&Self::key(bucket, path))
            .cloned()
            .ok_or_else(|| anyhow!("no such object {}", path))
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&Self::key(bucket, path));
        Ok(())
    }
}

/// Warehouse with fixed schemas that records every load.
#[derive(Default)]
pub struct MemoryWarehouse {
    /// Table id → column names. Tables not listed fail schema lookup.
    pub schemas: HashMap<String, Vec<String>>,
    pub loads: Mutex<Vec<(String, String)>>,
    pub fail_loads: bool,
}

impl MemoryWarehouse {
    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.schemas.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn loaded_tables(&self) -> Vec<String> {
        self.loads
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn schema(&self, table: &TableRef) -> Result<Vec<String>> {
        self.schemas
            .get(&table.to_string())
            .cloned()
            .ok_or_else(|| anyhow!("Not found: Table {}", table))
    }

    async fn load_append(&self, table: &TableRef, csv: Vec<u8>) -> Result<()> {
        if self.fail_loads {
            bail!("load job into {} failed", table);
        }
        self.loads
            .lock()
            .unwrap()
            .push((table.to_string(), String::from_utf8(csv)?));
        Ok(())
    }
}
