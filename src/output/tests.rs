//! Tests for output module

use super::*;
use crate::flatten::{FlatTable, Flattener};
use arrow::array::{Array, Float64Array, Int64Array, ListArray, StringArray, StructArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::tempdir;

fn table(records: &[Value]) -> FlatTable {
    Flattener::default().flatten(records).0
}

fn read_back(bytes: Bytes) -> Vec<RecordBatch> {
    ParquetRecordBatchReaderBuilder::try_new(bytes)
        .unwrap()
        .build()
        .unwrap()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

// ============================================================================
// Schema Inference Tests
// ============================================================================

#[test]
fn test_infer_schema_empty() {
    let schema = infer_schema(&FlatTable::default());
    assert!(schema.fields().is_empty());
}

#[test]
fn test_infer_schema_follows_column_order() {
    let t = table(&[json!({"features": [{"name": "Alice", "age": 30, "active": true}]})]);
    let schema = infer_schema(&t);

    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["features_name", "features_age", "features_active"]);
    assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
    assert_eq!(schema.field(1).data_type(), &DataType::Int64);
    assert_eq!(schema.field(2).data_type(), &DataType::Boolean);
}

#[test]
fn test_infer_schema_mixed_numbers() {
    let t = table(&[json!({"features": [{"value": 42}, {"value": 3.14}]})]);
    let schema = infer_schema(&t);
    assert_eq!(
        schema.field_with_name("features_value").unwrap().data_type(),
        &DataType::Float64
    );
}

#[test]
fn test_infer_schema_conflicting_types_fall_back_to_string() {
    let t = table(&[json!({"features": [{"value": 42}, {"value": "n/a"}]})]);
    let schema = infer_schema(&t);
    assert_eq!(
        schema.field_with_name("features_value").unwrap().data_type(),
        &DataType::Utf8
    );
}

#[test]
fn test_infer_schema_all_null_column_is_string() {
    let t = table(&[json!({"features": [{"note": null}, {"note": null}]})]);
    let schema = infer_schema(&t);
    let field = schema.field_with_name("features_note").unwrap();
    assert_eq!(field.data_type(), &DataType::Utf8);
    assert!(field.is_nullable());
}

#[test]
fn test_infer_schema_list_merges_all_elements() {
    // First element is an integer, later ones floats
    let t = table(&[json!({"features": [{"coordinates": [-75, 45.4]}]})]);
    let schema = infer_schema(&t);

    match schema.field_with_name("features_coordinates").unwrap().data_type() {
        DataType::List(item) => assert_eq!(item.data_type(), &DataType::Float64),
        other => panic!("Expected List type, got {other:?}"),
    }
}

#[test]
fn test_infer_schema_objects_inside_lists_become_structs() {
    let t = table(&[json!({"features": [{"contact": [
        {"organisation": {"en": "NRCan"}, "role": "owner"},
        {"email": "x@example.com"}
    ]}]})]);
    let schema = infer_schema(&t);

    let DataType::List(item) = schema.field_with_name("features_contact").unwrap().data_type()
    else {
        panic!("Expected List type");
    };
    let DataType::Struct(fields) = item.data_type() else {
        panic!("Expected Struct item");
    };
    let names: Vec<&str> = fields.iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["organisation", "role", "email"]);
}

// ============================================================================
// Table to Arrow Tests
// ============================================================================

#[test]
fn test_table_to_arrow_missing_values_are_null() {
    let t = table(&[
        json!({"features": [{"id": 1, "name": "Alice"}]}),
        json!({"features": [{"id": 2}]}),
    ]);

    let batch = table_to_arrow(&t, None).unwrap();
    assert_eq!(batch.num_rows(), 2);

    let names = batch
        .column_by_name("features_name")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(names.value(0), "Alice");
    assert!(names.is_null(1));
}

#[test]
fn test_table_to_arrow_float_column_keeps_integers() {
    let t = table(&[json!({"features": [{"v": 1}, {"v": 2.5}]})]);
    let batch = table_to_arrow(&t, None).unwrap();

    let values = batch
        .column_by_name("features_v")
        .unwrap()
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert!((values.value(0) - 1.0).abs() < f64::EPSILON);
    assert!((values.value(1) - 2.5).abs() < f64::EPSILON);
}

#[test]
fn test_table_to_arrow_string_fallback_keeps_json_text() {
    let t = table(&[json!({"features": [{"v": 1}, {"v": "x"}, {"v": null}]})]);
    let batch = table_to_arrow(&t, None).unwrap();

    let values = batch
        .column_by_name("features_v")
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(values.value(0), "1");
    assert_eq!(values.value(1), "x");
    assert!(values.is_null(2));
}

#[test]
fn test_table_to_arrow_lists_and_null_lists() {
    let t = table(&[json!({"features": [
        {"tags": ["a", "b"]},
        {"tags": []},
        {"other": 1}
    ]})]);
    let batch = table_to_arrow(&t, None).unwrap();

    let tags = batch
        .column_by_name("features_tags")
        .unwrap()
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    assert_eq!(tags.value_length(0), 2);
    assert_eq!(tags.value_length(1), 0);
    assert!(!tags.is_null(1));
    assert!(tags.is_null(2));
}

#[test]
fn test_table_to_arrow_struct_items() {
    let t = table(&[json!({"features": [{"links": [{"url": "a", "size": 1}, {"url": "b"}]}]})]);
    let batch = table_to_arrow(&t, None).unwrap();

    let links = batch
        .column_by_name("features_links")
        .unwrap()
        .as_any()
        .downcast_ref::<ListArray>()
        .unwrap();
    let items = links.value(0);
    let structs = items.as_any().downcast_ref::<StructArray>().unwrap();
    assert_eq!(structs.len(), 2);

    let sizes = structs
        .column_by_name("size")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(sizes.value(0), 1);
    assert!(sizes.is_null(1));
}

#[test]
fn test_describe_schema() {
    let t = table(&[json!({"features": [{"id": 1}]})]);
    let described = describe_schema(&infer_schema(&t));
    assert_eq!(described, "features_id: Int64");
}

#[test]
fn test_preview_rows_limits_output() {
    let t = table(&[json!({"features": [{"id": 1}, {"id": 2}, {"id": 3}]})]);
    let batch = table_to_arrow(&t, None).unwrap();

    let preview: Value = serde_json::from_str(&preview_rows(&batch, 2).unwrap()).unwrap();
    assert_eq!(preview, json!([{"features_id": 1}, {"features_id": 2}]));
}

// ============================================================================
// Parquet Writer Config Tests
// ============================================================================

#[test]
fn test_parquet_writer_config_default() {
    let config = ParquetWriterConfig::default();
    assert!(config.is_dictionary_enabled());
    assert!(config.is_statistics_enabled());
    assert_eq!(config.compression(), parquet::basic::Compression::SNAPPY);
}

#[test]
fn test_parquet_writer_config_builder() {
    let config = ParquetWriterConfig::new()
        .with_row_group_size(1000)
        .with_dictionary(false)
        .with_statistics(false)
        .uncompressed();

    assert!(!config.is_dictionary_enabled());
    assert!(!config.is_statistics_enabled());
    assert_eq!(config.row_group_size(), 1000);
    assert_eq!(
        config.compression(),
        parquet::basic::Compression::UNCOMPRESSED
    );
}

#[test]
fn test_parquet_writer_config_from_output() {
    let mut output = crate::config::OutputConfig::default();
    output.compression = crate::config::CompressionCodec::Gzip;
    output.row_group_size = 64;

    let config = ParquetWriterConfig::from_output(&output);
    assert_eq!(config.row_group_size(), 64);
    assert!(matches!(
        config.compression(),
        parquet::basic::Compression::GZIP(_)
    ));
}

// ============================================================================
// Encoder Tests
// ============================================================================

#[test]
fn test_encode_roundtrips_rows_and_columns() {
    let t = table(&[
        json!({"title": "lakes", "features": [{"id": 1}, {"id": 2}]}),
        json!({"title": "rivers", "features": [{"id": 3, "extra": "x"}]}),
    ]);

    let (batch, bytes) = ColumnarEncoder::default().encode(&t).unwrap();
    assert_eq!(batch.num_rows(), 3);

    let batches = read_back(bytes);
    let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(rows, 3);

    let schema = batches[0].schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, vec!["features_id", "title", "features_extra"]);
}

#[test]
fn test_encode_empty_table() {
    let (batch, bytes) = ColumnarEncoder::default()
        .encode(&FlatTable::default())
        .unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.schema().field(0).name(), "features_empty");

    let rows: usize = read_back(bytes).iter().map(RecordBatch::num_rows).sum();
    assert_eq!(rows, 0);
}

#[test]
fn test_encode_rows_without_columns() {
    // Empty elements yield rows that carry no fields
    let t = table(&[json!({"features": [{}, {}]})]);
    assert_eq!(t.num_rows(), 2);

    let (batch, _) = ColumnarEncoder::default().encode(&t).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 1);
}

#[test]
fn test_encode_to_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records500.parquet");
    let t = table(&[json!({"features": [{"id": 1}, {"id": 2}]})]);

    let (_, rows) = ColumnarEncoder::default()
        .encode_to_file(&t, &path)
        .unwrap();
    assert_eq!(rows, 2);

    let bytes = Bytes::from(std::fs::read(&path).unwrap());
    let total: usize = read_back(bytes).iter().map(RecordBatch::num_rows).sum();
    assert_eq!(total, 2);
}

#[test]
fn test_parquet_writer_rows_written() {
    let t = table(&[json!({"features": [{"id": 1}, {"id": 2}]})]);
    let batch = table_to_arrow(&t, None).unwrap();

    let config = ParquetWriterConfig::default();
    let mut writer = ParquetWriter::try_new(Vec::new(), batch.schema().as_ref(), &config).unwrap();
    assert_eq!(writer.rows_written(), 0);

    writer.write(&batch).unwrap();
    writer.write(&batch).unwrap();
    assert_eq!(writer.rows_written(), 4);

    let buffer = writer.into_inner().unwrap();
    assert_eq!(&buffer[..4], b"PAR1");
}

// ============================================================================
// Archive Tests
// ============================================================================

#[test]
fn test_archive_indent_and_utf8() {
    let records = vec![json!({"title": "Lacs du Québec"})];
    let bytes = encode_archive(&records, 4).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    assert_eq!(text, "[\n    {\n        \"title\": \"Lacs du Québec\"\n    }\n]");
}

#[test]
fn test_archive_parses_back_to_records() {
    let records = vec![json!({"b": 1, "a": [1, 2]}), json!({"c": null})];
    let bytes = encode_archive(&records, 2).unwrap();

    let parsed: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed, records);
}

#[test]
fn test_archive_empty_batch() {
    let bytes = encode_archive(&[], 4).unwrap();
    assert_eq!(bytes.as_ref(), b"[]");
}
