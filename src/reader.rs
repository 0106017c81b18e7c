//! Table reader: file path → [`DataFrame`].
//!
//! Dispatches on the file extension. Supported formats:
//!
//! - `.csv` — parsed with [`CsvParser`](crate::csv_parser::CsvParser)
//! - `.parquet` — decoded via the Arrow record-batch reader
//!
//! Any other extension is rejected with
//! [`ProfileError::UnsupportedExtension`] so callers can distinguish
//! "wrong file type" from decode failures.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray, TimestampSecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType as ArrowDataType, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::csv_parser::CsvParser;
use crate::dataframe::{Column, DataFrame, ValidityBitmap};
use crate::error::ProfileError;

/// Reads a table from a file path, dispatching on the extension.
pub fn read_table(path: impl AsRef<Path>) -> Result<DataFrame, ProfileError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => CsvParser::new().parse_file(&path.to_string_lossy()),
        "parquet" => read_parquet_file(path),
        _ => Err(ProfileError::UnsupportedExtension { extension }),
    }
}

/// Reads a Parquet file from disk.
fn read_parquet_file(path: &Path) -> Result<DataFrame, ProfileError> {
    let data = std::fs::read(path)?;
    read_parquet_bytes(&data)
}

/// Decodes a complete Parquet file held in memory.
pub fn read_parquet_bytes(data: &[u8]) -> Result<DataFrame, ProfileError> {
    let bytes = bytes::Bytes::copy_from_slice(data);
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .map_err(|e| ProfileError::Parquet(format!("cannot read Parquet footer: {e}")))?;
    let schema = builder.schema().clone();
    let reader = builder
        .build()
        .map_err(|e| ProfileError::Parquet(e.to_string()))?;
    let batches: Vec<RecordBatch> = reader
        .collect::<Result<_, _>>()
        .map_err(|e| ProfileError::Parquet(e.to_string()))?;
    dataframe_from_batches(&schema, &batches)
}

// ── Arrow conversion ──────────────────────────────────────────────────

/// Storage kind a column is converted into.
enum Target {
    Numeric,
    Boolean,
    Datetime,
    Strings,
}

fn target_for(dt: &ArrowDataType) -> Target {
    match dt {
        ArrowDataType::Int8
        | ArrowDataType::Int16
        | ArrowDataType::Int32
        | ArrowDataType::Int64
        | ArrowDataType::UInt8
        | ArrowDataType::UInt16
        | ArrowDataType::UInt32
        | ArrowDataType::UInt64
        | ArrowDataType::Float32
        | ArrowDataType::Float64 => Target::Numeric,
        ArrowDataType::Boolean => Target::Boolean,
        ArrowDataType::Timestamp(_, _) | ArrowDataType::Date32 | ArrowDataType::Date64 => {
            Target::Datetime
        }
        // Utf8 and everything unmapped: strings are always a valid fallback.
        _ => Target::Strings,
    }
}

fn dataframe_from_batches(
    schema: &Arc<Schema>,
    batches: &[RecordBatch],
) -> Result<DataFrame, ProfileError> {
    let mut df = DataFrame::new();
    for (col_idx, field) in schema.fields().iter().enumerate() {
        let arrays: Vec<ArrayRef> = batches.iter().map(|b| b.column(col_idx).clone()).collect();
        let column = convert_arrays(field.data_type(), &arrays)?;
        df.add_column(field.name().clone(), column)?;
    }
    Ok(df)
}

fn convert_arrays(dt: &ArrowDataType, arrays: &[ArrayRef]) -> Result<Column, ProfileError> {
    match target_for(dt) {
        Target::Numeric => {
            let mut values = Vec::new();
            let mut validity = ValidityBitmap::empty();
            for arr in arrays {
                let casted = cast(arr, &ArrowDataType::Float64)
                    .map_err(|e| ProfileError::Parquet(e.to_string()))?;
                let floats = casted
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| ProfileError::Parquet("numeric cast mismatch".into()))?;
                for i in 0..floats.len() {
                    if floats.is_null(i) {
                        values.push(0.0);
                        validity.push(false);
                    } else {
                        values.push(floats.value(i));
                        validity.push(true);
                    }
                }
            }
            Ok(Column::numeric(values, validity))
        }
        Target::Boolean => {
            let mut values = Vec::new();
            let mut validity = ValidityBitmap::empty();
            for arr in arrays {
                let bools = arr
                    .as_any()
                    .downcast_ref::<BooleanArray>()
                    .ok_or_else(|| ProfileError::Parquet("boolean array mismatch".into()))?;
                for i in 0..bools.len() {
                    if bools.is_null(i) {
                        values.push(false);
                        validity.push(false);
                    } else {
                        values.push(bools.value(i));
                        validity.push(true);
                    }
                }
            }
            Ok(Column::boolean(values, validity))
        }
        Target::Datetime => {
            let mut values = Vec::new();
            let mut validity = ValidityBitmap::empty();
            let seconds = ArrowDataType::Timestamp(TimeUnit::Second, None);
            for arr in arrays {
                let casted = cast(arr, &seconds)
                    .map_err(|e| ProfileError::Parquet(e.to_string()))?;
                let stamps = casted
                    .as_any()
                    .downcast_ref::<TimestampSecondArray>()
                    .ok_or_else(|| ProfileError::Parquet("timestamp cast mismatch".into()))?;
                for i in 0..stamps.len() {
                    if stamps.is_null(i) {
                        values.push(0);
                        validity.push(false);
                    } else {
                        values.push(stamps.value(i));
                        validity.push(true);
                    }
                }
            }
            Ok(Column::datetime(values, validity))
        }
        Target::Strings => {
            let mut values: Vec<Option<String>> = Vec::new();
            for arr in arrays {
                match cast(arr, &ArrowDataType::Utf8) {
                    Ok(casted) => {
                        let strings = casted
                            .as_any()
                            .downcast_ref::<StringArray>()
                            .ok_or_else(|| ProfileError::Parquet("string cast mismatch".into()))?;
                        for i in 0..strings.len() {
                            if strings.is_null(i) {
                                values.push(None);
                            } else {
                                values.push(Some(strings.value(i).to_string()));
                            }
                        }
                    }
                    Err(e) => {
                        // No string rendering for this type; keep the rows as nulls.
                        log::warn!("cannot render column of type {dt} as text: {e}");
                        values.extend(std::iter::repeat_with(|| None).take(arr.len()));
                    }
                }
            }
            Ok(crate::csv_parser::column_from_strings(values))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::DataType;
    use arrow::array::{Date32Array, Int64Array};
    use arrow::datatypes::Field;
    use parquet::arrow::ArrowWriter;

    fn sample_parquet_bytes() -> Vec<u8> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", ArrowDataType::Int64, false),
            Field::new("score", ArrowDataType::Float64, true),
            Field::new("name", ArrowDataType::Utf8, true),
            Field::new("active", ArrowDataType::Boolean, true),
            Field::new("ts", ArrowDataType::Timestamp(TimeUnit::Second, None), true),
            Field::new("day", ArrowDataType::Date32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(Float64Array::from(vec![Some(0.5), None, Some(2.5)])),
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), None])),
                Arc::new(BooleanArray::from(vec![Some(true), Some(false), None])),
                Arc::new(TimestampSecondArray::from(vec![
                    Some(1_704_067_200),
                    None,
                    Some(1_704_153_600),
                ])),
                Arc::new(Date32Array::from(vec![Some(0), Some(1), None])),
            ],
        )
        .unwrap();

        let mut buf = Vec::new();
        let mut writer = ArrowWriter::try_new(&mut buf, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        buf
    }

    #[test]
    fn parquet_roundtrip() {
        let data = sample_parquet_bytes();
        let df = read_parquet_bytes(&data).unwrap();

        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column_count(), 6);

        let id = df.column_by_name("id").unwrap();
        assert_eq!(id.data_type(), DataType::Numeric);
        assert_eq!(id.as_numeric().unwrap(), &[1.0, 2.0, 3.0]);

        let score = df.column_by_name("score").unwrap();
        assert_eq!(score.null_count(), 1);
        assert!(!score.is_valid(1));

        let name = df.column_by_name("name").unwrap();
        assert_eq!(name.null_count(), 1);

        let active = df.column_by_name("active").unwrap();
        assert_eq!(active.data_type(), DataType::Boolean);

        let ts = df.column_by_name("ts").unwrap();
        assert_eq!(ts.data_type(), DataType::Datetime);
        assert_eq!(ts.valid_datetime_values().unwrap(), vec![1_704_067_200, 1_704_153_600]);

        // Date32 days convert to epoch seconds
        let day = df.column_by_name("day").unwrap();
        assert_eq!(day.data_type(), DataType::Datetime);
        assert_eq!(day.valid_datetime_values().unwrap(), vec![0, 86_400]);
    }

    #[test]
    fn parquet_garbage_bytes() {
        let err = read_parquet_bytes(b"not parquet").unwrap_err();
        assert!(matches!(err, ProfileError::Parquet(_)));
    }

    #[test]
    fn unsupported_extension() {
        let err = read_table("data.xlsx").unwrap_err();
        assert_eq!(
            err,
            ProfileError::UnsupportedExtension {
                extension: "xlsx".to_string()
            }
        );
    }

    #[test]
    fn missing_extension() {
        let err = read_table("data").unwrap_err();
        assert!(matches!(err, ProfileError::UnsupportedExtension { .. }));
    }

    #[test]
    fn read_csv_from_disk() {
        let path = std::env::temp_dir().join("tablescope_reader_test.csv");
        std::fs::write(&path, "x,y\n1,a\n2,b\n").unwrap();
        let df = read_table(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(df.row_count(), 2);
        assert_eq!(df.column_names(), &["x", "y"]);
    }
}
