use serde_json::Value;

use crate::types::{EvalError, FieldMap};

/// Flatten a serialized JSON object into dotted-path keys.
///
/// Numbers keep their source text. Nulls are skipped. Array elements are
/// keyed by index, e.g. `spec.containers.0.image`.
///
/// # Errors
///
/// Returns [`EvalError::EmptyInput`] for zero-length input and
/// [`EvalError::Decode`] when `raw` is not a well-formed JSON object.
pub fn flatten(raw: &[u8]) -> Result<FieldMap, EvalError> {
    if raw.is_empty() {
        return Err(EvalError::EmptyInput);
    }
    let value: Value = serde_json::from_slice(raw).map_err(|e| EvalError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(EvalError::Decode("top-level value is not an object".to_owned()));
    }
    Ok(flatten_value(&value))
}

/// Flatten an already-decoded value. Scalars at the top level have no key
/// and are dropped.
#[must_use]
pub fn flatten_value(value: &Value) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut path = String::new();
    walk(value, &mut path, &mut fields);
    fields
}

fn walk(value: &Value, path: &mut String, out: &mut FieldMap) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                descend(child, key, path, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                descend(child, &index.to_string(), path, out);
            }
        }
        Value::String(s) if !path.is_empty() => out.insert(path, s.clone()),
        Value::Bool(b) if !path.is_empty() => out.insert(path, b.to_string()),
        Value::Number(n) if !path.is_empty() => out.insert(path, n.to_string()),
        _ => {}
    }
}

fn descend(child: &Value, key: &str, path: &mut String, out: &mut FieldMap) {
    let len = path.len();
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(key);
    walk(child, path, out);
    path.truncate(len);
}
