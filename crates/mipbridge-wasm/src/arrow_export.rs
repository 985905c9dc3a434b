//! Arrow IPC export for solve results
//!
//! Serializes variable values and LP row duals into Arrow IPC streams, so
//! JavaScript can load them without per-value boundary calls.
//!
//! The resulting bytes can be loaded directly by:
//! - Apache Arrow JS (`@apache-arrow/ts`)
//! - DuckDB-WASM (for SQL queries on results)

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;

use crate::report::{LpRowValue, VariableValue};

fn write_stream(schema: Schema, columns: Vec<ArrayRef>) -> Result<Vec<u8>, String> {
    let batch = RecordBatch::try_new(Arc::new(schema.clone()), columns)
        .map_err(|e| format!("Failed to create RecordBatch: {}", e))?;

    let mut buf = Vec::new();
    {
        let mut writer =
            StreamWriter::try_new(&mut buf, &schema).map_err(|e| format!("Writer error: {}", e))?;
        writer
            .write(&batch)
            .map_err(|e| format!("Write error: {}", e))?;
        writer
            .finish()
            .map_err(|e| format!("Finish error: {}", e))?;
    }

    Ok(buf)
}

/// Create an Arrow IPC stream containing variable values
///
/// Schema: name (string), value (float64, null without a solution)
pub fn variables_to_arrow(variables: &[VariableValue]) -> Result<Vec<u8>, String> {
    let schema = Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("value", DataType::Float64, true),
    ]);

    let names: StringArray = variables.iter().map(|v| Some(v.name.as_str())).collect();
    let values: Float64Array = variables.iter().map(|v| v.value).collect();

    write_stream(
        schema,
        vec![Arc::new(names) as ArrayRef, Arc::new(values) as ArrayRef],
    )
}

/// Create an Arrow IPC stream containing the current LP rows
///
/// Schema: row_id (int32), name (string), dual (float64), farkas (float64)
pub fn lp_rows_to_arrow(rows: &[LpRowValue]) -> Result<Vec<u8>, String> {
    let schema = Schema::new(vec![
        Field::new("row_id", DataType::Int32, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("dual", DataType::Float64, false),
        Field::new("farkas", DataType::Float64, false),
    ]);

    let ids: Int32Array = rows.iter().map(|r| Some(r.handle)).collect();
    let names: StringArray = rows.iter().map(|r| Some(r.name.as_str())).collect();
    let duals: Float64Array = rows.iter().map(|r| Some(r.dual)).collect();
    let farkas: Float64Array = rows.iter().map(|r| Some(r.farkas)).collect();

    write_stream(
        schema,
        vec![
            Arc::new(ids) as ArrayRef,
            Arc::new(names) as ArrayRef,
            Arc::new(duals) as ArrayRef,
            Arc::new(farkas) as ArrayRef,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::ipc::reader::StreamReader;
    use std::io::Cursor;

    #[test]
    fn test_variables_arrow_roundtrip() {
        let variables = vec![
            VariableValue {
                name: "x".to_string(),
                value: Some(1.0),
            },
            VariableValue {
                name: "y".to_string(),
                value: None,
            },
        ];

        let bytes = variables_to_arrow(&variables).expect("should serialize");
        assert!(!bytes.is_empty());

        let reader = StreamReader::try_new(Cursor::new(bytes), None).expect("should read");
        let batches: Vec<_> = reader.collect::<Result<_, _>>().expect("should collect");
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 2);
        assert_eq!(batches[0].num_columns(), 2);
        assert_eq!(batches[0].column(1).null_count(), 1);
    }

    #[test]
    fn test_lp_rows_to_arrow() {
        let rows = vec![LpRowValue {
            handle: 1,
            name: "c1".to_string(),
            dual: 1.0,
            farkas: 0.0,
        }];
        let bytes = lp_rows_to_arrow(&rows).unwrap();
        // Arrow IPC stream starts with the continuation marker
        assert_eq!(&bytes[0..4], b"\xff\xff\xff\xff");

        let empty = lp_rows_to_arrow(&[]).unwrap();
        let reader = StreamReader::try_new(Cursor::new(empty), None).unwrap();
        assert_eq!(reader.schema().fields().len(), 4);
    }
}
