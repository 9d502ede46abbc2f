//! FILENAME: core/engine/src/flatten.rs
//! PURPOSE: Converts nested records into single-level records keyed by dotted paths.
//!
//! Rules per field:
//! - object: flattened recursively under `prefix.key`
//! - non-empty array whose first element is an object: that first element is
//!   flattened under the prefix, later elements are dropped
//! - anything else: copied as is
//!
//! Empty objects contribute no columns. Flattening a flat record is a no-op.

use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::value::Record;

/// Maximum object nesting accepted before flattening fails.
pub const MAX_FLATTEN_DEPTH: usize = 64;

pub fn flatten(record: &Record) -> EngineResult<Record> {
    let mut out = Record::new();
    flatten_into(record, "", 0, &mut out)?;
    Ok(out)
}

/// Flattens every record, preserving order.
pub fn flatten_all(records: &[Record]) -> EngineResult<Vec<Record>> {
    records.iter().map(flatten).collect()
}

fn flatten_into(map: &Record, prefix: &str, depth: usize, out: &mut Record) -> EngineResult<()> {
    if depth > MAX_FLATTEN_DEPTH {
        return Err(EngineError::NestingTooDeep { depth: MAX_FLATTEN_DEPTH });
    }
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) => flatten_into(inner, &column, depth + 1, out)?,
            Value::Array(items) => match items.first() {
                Some(Value::Object(first)) => flatten_into(first, &column, depth + 1, out)?,
                _ => {
                    out.insert(column, value.clone());
                }
            },
            _ => {
                out.insert(column, value.clone());
            }
        }
    }
    Ok(())
}

/// Union of column names across records, in first-seen order.
pub fn column_names(records: &[Record]) -> Vec<String> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut columns = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}
