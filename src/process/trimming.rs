use crate::process::utils::scrub_newlines;
use anyhow::Result;
use arrow::{
    array::{ArrayRef, StringArray},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Replace line breaks in every text column with spaces.
pub fn apply_newline_scrub(batch: &RecordBatch) -> Result<RecordBatch> {
    let mut cols = Vec::with_capacity(batch.num_columns());
    for arr in batch.columns() {
        if let Some(sarr) = arr.as_any().downcast_ref::<StringArray>() {
            if sarr.iter().flatten().any(|v| v.contains(['\n', '\r'])) {
                let scrubbed: StringArray = sarr.iter().map(|opt| opt.map(scrub_newlines)).collect();
                cols.push(Arc::new(scrubbed) as ArrayRef);
                continue;
            }
        }
        cols.push(arr.clone());
    }

    RecordBatch::try_new(batch.schema(), cols).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{Array, Float64Array},
        datatypes::{DataType, Field, Schema},
    };

    #[test]
    fn only_text_columns_are_touched() -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Observaciones", DataType::Utf8, true),
            Field::new("Total", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![Some("línea 1\nlínea 2"), None, Some("a\r\nb")])),
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])),
            ],
        )?;

        let out = apply_newline_scrub(&batch)?;
        let obs = out.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(obs.value(0), "línea 1 línea 2");
        assert!(obs.is_null(1));
        assert_eq!(obs.value(2), "a  b");
        assert_eq!(out.column(1), batch.column(1));
        Ok(())
    }
}
