//! Arrow schema inference and flat table to Arrow conversion
//!
//! Types are inferred per column over every row, so a column that holds an
//! integer in one row and a float in another becomes Float64, and a column
//! whose rows disagree entirely falls back to JSON text.

use crate::error::{Error, Result};
use crate::flatten::{sanitize_column_name, FlatTable};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, StringArray, StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Infer an Arrow schema for a flat table
///
/// Fields follow the table's column order and are all nullable. Columns that
/// only ever hold null are typed Utf8 so every column has a concrete
/// Parquet physical type.
pub fn infer_schema(table: &FlatTable) -> Schema {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|name| {
            let data_type = table
                .rows()
                .iter()
                .filter_map(|row| row.get(name))
                .map(infer_type)
                .fold(DataType::Null, |acc, t| merge_types(&acc, &t));
            Field::new(name, finalize_type(data_type), true)
        })
        .collect();

    Schema::new(fields)
}

/// Convert a flat table to an Arrow RecordBatch
///
/// Uses the provided schema or infers one from the data. Values missing from
/// a row, or not matching the column type, become null.
pub fn table_to_arrow(table: &FlatTable, schema: Option<&Schema>) -> Result<RecordBatch> {
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(table),
    };
    let schema = Arc::new(schema);

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let values: Vec<Option<&Value>> = table
            .rows()
            .iter()
            .map(|row| row.get(field.name()))
            .collect();
        columns.push(build_array(&values, field.data_type())?);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
    RecordBatch::try_new_with_options(schema, columns, &options)
        .map_err(|e| Error::output(format!("Failed to create RecordBatch: {e}")))
}

/// Render a schema as `name: type` lines
pub fn describe_schema(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| format!("{}: {}", f.name(), f.data_type()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the first `limit` rows of a batch as a JSON array
pub fn preview_rows(batch: &RecordBatch, limit: usize) -> Result<String> {
    let head = batch.slice(0, limit.min(batch.num_rows()));
    let mut writer = arrow::json::ArrayWriter::new(Vec::new());
    writer.write(&head)?;
    writer.finish()?;
    String::from_utf8(writer.into_inner()).map_err(|e| Error::output(e.to_string()))
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) => DataType::Utf8,
        Value::Array(items) => {
            let element_type = items
                .iter()
                .map(infer_type)
                .fold(DataType::Null, |acc, t| merge_types(&acc, &t));
            DataType::List(Arc::new(Field::new("item", element_type, true)))
        }
        // A struct needs at least one child to be written
        Value::Object(obj) if obj.is_empty() => DataType::Utf8,
        Value::Object(obj) => {
            let mut fields: Vec<Field> = Vec::with_capacity(obj.len());
            for (key, child) in obj {
                let name = sanitize_column_name(key);
                let child_type = infer_type(child);
                match fields.iter_mut().find(|f| f.name() == &name) {
                    Some(existing) => {
                        let merged = merge_types(existing.data_type(), &child_type);
                        *existing = Field::new(name, merged, true);
                    }
                    None => fields.push(Field::new(name, child_type, true)),
                }
            }
            DataType::Struct(Fields::from(fields))
        }
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        // Same types
        (a, b) if a == b => a.clone(),

        // Null can merge with anything
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        // Numbers can merge (prefer Float64 for mixed)
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        (DataType::List(a), DataType::List(b)) => {
            let item = merge_types(a.data_type(), b.data_type());
            DataType::List(Arc::new(Field::new("item", item, true)))
        }

        (DataType::Struct(a), DataType::Struct(b)) => DataType::Struct(merge_fields(a, b)),

        // Different types -> fall back to String (most flexible)
        _ => DataType::Utf8,
    }
}

/// Union of two struct field sets, merging types of shared names
fn merge_fields(a: &Fields, b: &Fields) -> Fields {
    let mut merged: Vec<Field> = a.iter().map(|f| f.as_ref().clone()).collect();
    let positions: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, f)| (f.name().clone(), i))
        .collect();

    for field in b {
        match positions.get(field.name()) {
            Some(&i) => {
                let data_type = merge_types(merged[i].data_type(), field.data_type());
                merged[i] = Field::new(field.name(), data_type, true);
            }
            None => merged.push(field.as_ref().clone()),
        }
    }

    Fields::from(merged)
}

/// Replace Null types, which have no Parquet representation of their own
fn finalize_type(data_type: DataType) -> DataType {
    match data_type {
        DataType::Null => DataType::Utf8,
        DataType::List(item) => DataType::List(Arc::new(Field::new(
            "item",
            finalize_type(item.data_type().clone()),
            true,
        ))),
        DataType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|f| Field::new(f.name(), finalize_type(f.data_type().clone()), true))
                .collect::<Vec<_>>()
                .into(),
        ),
        other => other,
    }
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        // Utf8 and anything else: strings as-is, other values as JSON text
        _ => {
            let arr: StringArray = values
                .iter()
                .map(|v| match v {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(other) => Some(other.to_string()),
                })
                .collect();
            Ok(Arc::new(arr))
        }
    }
}

/// Build a list array from JSON arrays
fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity: Vec<bool> = Vec::with_capacity(values.len());

    for value in values {
        if let Some(Value::Array(arr)) = value {
            all_items.extend(arr.iter().map(Some));
            validity.push(true);
        } else {
            validity.push(false);
        }
        // Both array and non-array cases need an offset
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::output("Array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let offset_buffer = OffsetBuffer::new(offsets.into());
    let nulls = NullBuffer::from(validity);

    let list_array = ListArray::try_new(Arc::clone(field), offset_buffer, items_array, Some(nulls))?;
    Ok(Arc::new(list_array))
}

/// Build a struct array from JSON objects
fn build_struct_array(values: &[Option<&Value>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let child_values: Vec<Option<&Value>> = values
            .iter()
            .map(|v| match v {
                Some(Value::Object(obj)) => object_field(obj, field.name()),
                _ => None,
            })
            .collect();

        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let validity: Vec<bool> = values
        .iter()
        .map(|v| matches!(v, Some(Value::Object(_))))
        .collect();

    let struct_array =
        StructArray::try_new(fields.clone(), child_arrays, Some(NullBuffer::from(validity)))?;
    Ok(Arc::new(struct_array))
}

/// Look up a struct child by its sanitized name
fn object_field<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).or_else(|| {
        obj.iter()
            .find(|(key, _)| sanitize_column_name(key) == name)
            .map(|(_, value)| value)
    })
}
