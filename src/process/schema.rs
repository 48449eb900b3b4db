use calamine::Data;
use std::collections::HashMap;

use crate::process::{raw_table::RawTable, utils::is_blank};

/// Sheet data laid out column by column in destination table order.
#[derive(Debug)]
pub struct Reindexed {
    pub names: Vec<String>,
    pub columns: Vec<Vec<Data>>,
    pub num_rows: usize,
}

/// Align `raw` to `target`: every target column in order, absent ones
/// filled with empty text, columns the table does not know dropped.
pub fn reindex(raw: &RawTable, target: &[String]) -> Reindexed {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(raw.headers.len());
    for (i, h) in raw.headers.iter().enumerate() {
        position.entry(h.as_str()).or_insert(i);
    }

    let num_rows = raw.rows.len();
    let columns = target
        .iter()
        .map(|name| match position.get(name.as_str()) {
            Some(&i) => raw
                .rows
                .iter()
                .map(|row| row.get(i).cloned().unwrap_or(Data::Empty))
                .collect(),
            None => vec![Data::String(String::new()); num_rows],
        })
        .collect();

    Reindexed {
        names: target.to_vec(),
        columns,
        num_rows,
    }
}

impl Reindexed {
    /// `true` for every row that has at least one non-blank cell.
    pub fn non_blank_rows(&self) -> Vec<bool> {
        (0..self.num_rows)
            .map(|r| self.columns.iter().any(|col| !is_blank(&col[r])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn aligns_to_target_order_and_fills_missing() {
        let raw = RawTable {
            headers: names(&["B", "D"]),
            rows: vec![
                vec![Data::Float(1.0), Data::String("drop me".into())],
                vec![Data::Float(2.0), Data::Empty],
            ],
        };
        let out = reindex(&raw, &names(&["A", "B", "C"]));

        assert_eq!(out.names, names(&["A", "B", "C"]));
        assert_eq!(out.num_rows, 2);
        assert_eq!(out.columns[0], vec![Data::String(String::new()); 2]);
        assert_eq!(out.columns[1], vec![Data::Float(1.0), Data::Float(2.0)]);
        assert_eq!(out.columns[2], vec![Data::String(String::new()); 2]);
    }

    #[test]
    fn blank_rows_are_flagged_across_the_target_schema() {
        let raw = RawTable {
            headers: names(&["A", "B", "Extra"]),
            rows: vec![
                vec![Data::Empty, Data::String(" ".into()), Data::String("x".into())],
                vec![Data::Empty, Data::Float(0.0), Data::Empty],
            ],
        };
        let out = reindex(&raw, &names(&["A", "B", "Missing"]));
        // first row only had content in a column the table does not have
        assert_eq!(out.non_blank_rows(), vec![false, true]);
    }
}
