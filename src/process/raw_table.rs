use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx};
use std::{collections::HashMap, io::Cursor};
use tracing::debug;

use crate::process::utils::cell_text;

/// One worksheet as read from the workbook, before any cleaning.
#[derive(Debug, Default)]
pub struct RawTable {
    /// Column names from the header row, made unique.
    pub headers: Vec<String>,
    /// Data rows below the header, each padded to `headers.len()`.
    pub rows: Vec<Vec<Data>>,
}

/// Read `sheet` from in-memory `.xlsx` bytes. Worksheet rows are counted
/// from the top of the sheet: rows `0..skip_rows` are ignored, row
/// `skip_rows` holds the column names, everything below is data.
pub fn read_sheet(data: &[u8], sheet: &str, skip_rows: usize) -> Result<RawTable> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data)).context("opening workbook")?;
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("reading sheet {:?}", sheet))?;

    let Some((first_row, first_col)) = range.start() else {
        debug!(sheet, "sheet is empty");
        return Ok(RawTable::default());
    };
    let (first_row, first_col) = (first_row as usize, first_col as usize);
    let width = first_col + range.width();

    // Re-anchor every row at column A so positions match the sheet.
    let mut header_cells: Vec<Data> = vec![Data::Empty; width];
    let mut rows = Vec::new();
    for (i, row) in range.rows().enumerate() {
        let sheet_row = first_row + i;
        if sheet_row < skip_rows {
            continue;
        }
        let mut cells = vec![Data::Empty; width];
        cells[first_col..first_col + row.len()].clone_from_slice(row);
        if sheet_row == skip_rows {
            header_cells = cells;
        } else {
            rows.push(cells);
        }
    }

    let headers = unique_headers(&header_cells);
    debug!(sheet, columns = headers.len(), rows = rows.len(), "read sheet");
    Ok(RawTable { headers, rows })
}

/// Blank names become `Unnamed: {i}`; repeats get `.1`, `.2`, ... suffixes.
fn unique_headers(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = match cell_text(cell) {
                n if n.trim().is_empty() => format!("Unnamed: {}", i),
                n => n,
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let out = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            out
        })
        .collect()
}
