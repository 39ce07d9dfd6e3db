//! JSON <-> Firestore typed-value conversion
//!
//! Firestore stores every value wrapped in a one-key object naming its type
//! (`{"stringValue": "Ana"}`, `{"integerValue": "20"}`, ...). Integers travel
//! as decimal strings.

use serde_json::{json, Map, Number, Value};

use crate::error::{Result, StoreError};
use crate::record::Fields;

/// Wrap a JSON value in Firestore's typed representation
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(f64::NAN) }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every entry of a field map
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Unwrap a Firestore typed value into plain JSON
pub fn decode_value(value: &Value) -> Result<Value> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::invalid_response(format!("expected typed value, got {value}")))?;

    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| StoreError::invalid_response("empty typed value"))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => Ok(inner.clone()),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(inner.clone()),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => Ok(inner.clone()),
        "geoPointValue" => Ok(json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        "arrayValue" => {
            // Firestore omits `values` for an empty array
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                _ => Fields::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(StoreError::invalid_response(format!(
            "unsupported value type '{other}'"
        ))),
    }
}

/// Decode every entry of a Firestore `fields` object
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

fn decode_integer(inner: &Value) -> Result<Value> {
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(|i| Value::Number(Number::from(i)))
        .ok_or_else(|| StoreError::invalid_response(format!("bad integerValue {inner}")))
}
