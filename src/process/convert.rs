use anyhow::{bail, Result};
use arrow::{
    array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use calamine::Data;
use std::sync::Arc;

use crate::config::ColumnRules;
use crate::process::{date_parser, schema::Reindexed, utils};

/// How a destination column is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// ISO date text; unparsable → null.
    Date,
    /// Float; unparsable → 0.0.
    Float,
    /// Integer; unparsable → 0.
    Integer,
    /// Always text.
    Text,
    /// Type taken from the cells themselves.
    Inferred,
}

impl ColumnKind {
    pub fn for_column(rules: &ColumnRules, name: &str) -> Self {
        let listed = |set: &[String]| set.iter().any(|c| c == name);
        if listed(&rules.dates) {
            ColumnKind::Date
        } else if listed(&rules.floats) {
            ColumnKind::Float
        } else if listed(&rules.integers) {
            ColumnKind::Integer
        } else if listed(&rules.text) {
            ColumnKind::Text
        } else {
            ColumnKind::Inferred
        }
    }
}

/// Convert aligned sheet cells into typed arrow columns.
pub fn convert_to_final_types(table: &Reindexed, rules: &ColumnRules) -> Result<RecordBatch> {
    if table.names.is_empty() {
        bail!("destination table has no columns");
    }

    let mut fields = Vec::with_capacity(table.names.len());
    let mut out = Vec::with_capacity(table.names.len());
    for (name, cells) in table.names.iter().zip(&table.columns) {
        let (ty, arr) = match ColumnKind::for_column(rules, name) {
            ColumnKind::Date => {
                let mut b = StringBuilder::new();
                for cell in cells {
                    b.append_option(date_parser::cell_date(cell).map(date_parser::iso));
                }
                (DataType::Utf8, Arc::new(b.finish()) as ArrayRef)
            }
            ColumnKind::Float => {
                let mut b = Float64Builder::with_capacity(cells.len());
                for cell in cells {
                    b.append_value(utils::cell_number(cell).unwrap_or(0.0));
                }
                (DataType::Float64, Arc::new(b.finish()) as ArrayRef)
            }
            ColumnKind::Integer => {
                let mut b = Int64Builder::with_capacity(cells.len());
                for cell in cells {
                    b.append_value(utils::cell_integer(cell).unwrap_or(0));
                }
                (DataType::Int64, Arc::new(b.finish()) as ArrayRef)
            }
            ColumnKind::Text => {
                let mut b = StringBuilder::new();
                for cell in cells {
                    b.append_value(utils::cell_text(cell));
                }
                (DataType::Utf8, Arc::new(b.finish()) as ArrayRef)
            }
            ColumnKind::Inferred => infer_column(cells),
        };
        fields.push(Field::new(name, ty, true));
        out.push(arr);
    }

    let schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(schema, out).map_err(Into::into)
}

/// Pick the narrowest type every non-empty cell fits: integer, float,
/// boolean, else text. Empty cells become nulls.
fn infer_column(cells: &[Data]) -> (DataType, ArrayRef) {
    let filled = || cells.iter().filter(|c| !matches!(c, Data::Empty));
    let has_values = filled().next().is_some();

    let all_int = filled().all(|c| match c {
        Data::Int(_) => true,
        Data::Float(f) => f.fract() == 0.0 && f.abs() < 1e15,
        _ => false,
    });
    let all_num = filled().all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
    let all_bool = filled().all(|c| matches!(c, Data::Bool(_)));

    if has_values && all_int {
        let mut b = Int64Builder::with_capacity(cells.len());
        for cell in cells {
            b.append_option(match cell {
                Data::Empty => None,
                other => utils::cell_integer(other),
            });
        }
        (DataType::Int64, Arc::new(b.finish()) as ArrayRef)
    } else if has_values && all_num {
        let mut b = Float64Builder::with_capacity(cells.len());
        for cell in cells {
            b.append_option(utils::cell_number(cell));
        }
        (DataType::Float64, Arc::new(b.finish()) as ArrayRef)
    } else if has_values && all_bool {
        let mut b = BooleanBuilder::with_capacity(cells.len());
        for cell in cells {
            b.append_option(match cell {
                Data::Bool(v) => Some(*v),
                _ => None,
            });
        }
        (DataType::Boolean, Arc::new(b.finish()) as ArrayRef)
    } else {
        let mut b = StringBuilder::new();
        for cell in cells {
            b.append_option(match cell {
                Data::Empty => None,
                other => Some(utils::cell_text(other)),
            });
        }
        (DataType::Utf8, Arc::new(b.finish()) as ArrayRef)
    }
}
