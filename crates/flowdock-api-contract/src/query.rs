//! Query string encoding for list options
//!
//! Option structs describe their query keys declaratively through serde
//! attributes. Encoding goes through `serde_json::Value` and keeps only flat
//! scalar fields; `null`, empty strings and `false` are dropped so unset
//! filters never reach the wire.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiContractError;

/// Encode `options` into ordered `(key, value)` query pairs.
pub fn to_query_pairs<T: Serialize + ?Sized>(
    options: &T,
) -> Result<Vec<(String, String)>, ApiContractError> {
    let value = serde_json::to_value(options)
        .map_err(|e| ApiContractError::UnsupportedOptions(e.to_string()))?;

    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Err(ApiContractError::MissingOptions("query options")),
        other => {
            return Err(ApiContractError::UnsupportedOptions(format!(
                "expected a struct of query fields, got {other}"
            )))
        }
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, val) in map {
        let val_str = match val {
            Value::Null | Value::Bool(false) => continue,
            Value::String(s) if s.is_empty() => continue,
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ApiContractError::UnsupportedOptions(format!(
                    "field `{key}` is not a scalar"
                )))
            }
        };
        pairs.push((key, val_str));
    }

    Ok(pairs)
}
