//! FILENAME: core/engine/src/value.rs
//! PURPOSE: Record type and the value normalization rules shared by every engine.
//! CONTEXT: Numeric coercion feeds the aggregators, canonical key strings feed
//! grouping and joins, canonical JSON feeds set de-duplication.

use serde_json::{Map, Number, Value};

/// A single record: field name to JSON value, in arrival field order.
pub type Record = Map<String, Value>;

/// Internal tag carried by records of a multi-dataset stream.
pub const DATASET_TAG: &str = "_dataset";

/// Identifier sub-field of lookup objects.
pub const ID_FIELD: &str = "_id";

/// Largest float that still round-trips exactly through an integer.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

// ============================================================================
// NUMERIC COERCION
// ============================================================================

/// Coerces a resolved value to a number.
/// Numbers pass through, numeric strings are parsed, `{value: N}` wrappers are
/// unwrapped. Booleans, null, arrays and non-numeric strings yield `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Object(map) => match map.get("value") {
            Some(inner @ (Value::Number(_) | Value::String(_))) => coerce_number(inner),
            _ => None,
        },
        _ => None,
    }
}

/// Converts a computed float back to JSON. Integral values become JSON
/// integers, non-finite values become null.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Value::from(value as i64);
    }
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// Renders a number in its shortest form. Integral floats lose the fraction so
/// that `7`, `7.0` and `"7"` normalize to the same key.
pub fn number_text(number: &Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => format!("{}", f),
        None => number.to_string(),
    }
}

// ============================================================================
// KEYS
// ============================================================================

/// String form used for grouping and join equality. `None` for null.
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(canonical_json(value)),
    }
}

/// Serializes a value with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(*key) {
                    write_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Number(n) => out.push_str(&number_text(n)),
        other => out.push_str(&other.to_string()),
    }
}

/// Returns the record as a JSON object without its dataset tag.
pub fn strip_internal(record: &Record) -> Value {
    let mut clean = record.clone();
    clean.shift_remove(DATASET_TAG);
    Value::Object(clean)
}
