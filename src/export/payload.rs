//! Validation and normalization of export payloads.
//!
//! The processing-hash block comes from the catalog (or the product details
//! endpoint) in the loose shape the web client stores it. The export endpoint
//! is strict about three keys, rewritten here:
//!
//! - `params`: a list of `[name, value]` pairs flattened to `"v1,v2,..."`
//! - `overdrive`: always `0`
//! - `trim`: a two-element integer range, `[0, 100]` when absent

use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::GmsHash;
use crate::gateway::ApiError;

/// Default trim range applied when the block has none.
pub const DEFAULT_TRIM: [i64; 2] = [0, 100];

/// Per-item payload failures; the item is skipped.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The item has no (or an empty) processing-hash block.
    #[error("item {item_id} has no processing-hash block")]
    MissingHashBlock {
        /// The item identifier.
        item_id: String,
    },

    /// The hash block is present but cannot be normalized.
    #[error("item {item_id} has an invalid processing-hash block: {reason}")]
    InvalidHashBlock {
        /// The item identifier.
        item_id: String,
        /// What was wrong.
        reason: String,
    },

    /// The product details needed to build the payload could not be fetched.
    #[error("product details unavailable for item {item_id}: {source}")]
    DetailsUnavailable {
        /// The item identifier.
        item_id: String,
        /// The underlying gateway error.
        #[source]
        source: ApiError,
    },
}

impl PayloadError {
    fn invalid(item_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidHashBlock {
            item_id: item_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Returns true if `block` is a usable (non-null, non-empty) hash block.
#[must_use]
pub fn is_present(block: &Value) -> bool {
    match block {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// Normalizes a raw hash block into the shape the export endpoint accepts.
///
/// # Errors
///
/// Returns [`PayloadError::MissingHashBlock`] for null or empty blocks and
/// [`PayloadError::InvalidHashBlock`] for blocks that are not objects or carry
/// non-numeric parameter values or trim bounds.
pub fn normalize_hash_block(item_id: &str, block: &Value) -> Result<GmsHash, PayloadError> {
    if !is_present(block) {
        return Err(PayloadError::MissingHashBlock {
            item_id: item_id.to_string(),
        });
    }
    let Some(source) = block.as_object() else {
        return Err(PayloadError::invalid(item_id, "expected a JSON object"));
    };

    let mut extra: Map<String, Value> = source.clone();
    let params = extra.remove("params");
    extra.remove("overdrive");
    let trim = extra.remove("trim");

    Ok(GmsHash {
        extra,
        params: flatten_params(item_id, params.as_ref())?,
        overdrive: 0,
        trim: normalize_trim(item_id, trim.as_ref())?,
    })
}

fn flatten_params(item_id: &str, params: Option<&Value>) -> Result<String, PayloadError> {
    match params {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(already_flat)) => Ok(already_flat.clone()),
        Some(Value::Array(entries)) => {
            let values = entries
                .iter()
                .map(|entry| {
                    let value = match entry {
                        Value::Array(pair) => pair.last(),
                        other => Some(other),
                    };
                    value
                        .and_then(as_integer)
                        .map(|v| v.to_string())
                        .ok_or_else(|| {
                            PayloadError::invalid(item_id, format!("non-numeric param {entry}"))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(values.join(","))
        }
        Some(other) => Err(PayloadError::invalid(
            item_id,
            format!("unexpected params value {other}"),
        )),
    }
}

fn normalize_trim(item_id: &str, trim: Option<&Value>) -> Result<[i64; 2], PayloadError> {
    let Some(trim) = trim.filter(|t| !t.is_null()) else {
        return Ok(DEFAULT_TRIM);
    };
    let bounds = trim
        .as_array()
        .filter(|bounds| bounds.len() >= 2)
        .ok_or_else(|| PayloadError::invalid(item_id, format!("trim must be a range, got {trim}")))?;
    let start = as_integer(&bounds[0])
        .ok_or_else(|| PayloadError::invalid(item_id, format!("non-numeric trim start {}", bounds[0])))?;
    let end = as_integer(&bounds[1])
        .ok_or_else(|| PayloadError::invalid(item_id, format!("non-numeric trim end {}", bounds[1])))?;
    Ok([start, end])
}

/// Integer view of a JSON number or numeric string; fractions truncate.
#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        Value::Bool(flag) => Some(i64::from(*flag)),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_flattens_params_and_forces_overdrive() {
        let block = json!({
            "model-id": 103_120,
            "mirror": false,
            "params": [["Overdrive", 1], ["Emotion", 0.0]],
            "overdrive": 55,
            "trim": [0.0, 100.0],
            "arm-space": 0
        });
        let hash = normalize_hash_block("a1", &block).unwrap();
        assert_eq!(hash.params, "1,0");
        assert_eq!(hash.overdrive, 0);
        assert_eq!(hash.trim, [0, 100]);
        assert_eq!(hash.extra.get("model-id"), Some(&json!(103_120)));
        assert_eq!(hash.extra.get("arm-space"), Some(&json!(0)));
        assert!(!hash.extra.contains_key("params"));
        assert!(!hash.extra.contains_key("overdrive"));
    }

    #[test]
    fn test_normalize_defaults_trim_and_params() {
        let hash = normalize_hash_block("a1", &json!({"model-id": 1})).unwrap();
        assert_eq!(hash.params, "");
        assert_eq!(hash.trim, DEFAULT_TRIM);
    }

    #[test]
    fn test_normalize_accepts_numeric_strings_and_truncates_fractions() {
        let block = json!({"params": [["Speed", "2"], ["Height", 3.9]], "trim": ["5", 95.5]});
        let hash = normalize_hash_block("a1", &block).unwrap();
        assert_eq!(hash.params, "2,3");
        assert_eq!(hash.trim, [5, 95]);
    }

    #[test]
    fn test_normalize_keeps_already_flat_params() {
        let hash = normalize_hash_block("a1", &json!({"params": "1,0"})).unwrap();
        assert_eq!(hash.params, "1,0");
    }

    #[test]
    fn test_missing_or_empty_block_is_missing() {
        for block in [json!(null), json!({}), json!([])] {
            assert!(matches!(
                normalize_hash_block("a1", &block),
                Err(PayloadError::MissingHashBlock { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_blocks_are_rejected() {
        for block in [
            json!(["not", "an", "object"]),
            json!({"params": [["Overdrive", "lots"]]}),
            json!({"trim": [10]}),
            json!({"trim": ["start", 100]}),
            json!({"params": 12}),
        ] {
            assert!(
                matches!(
                    normalize_hash_block("a1", &block),
                    Err(PayloadError::InvalidHashBlock { .. })
                ),
                "expected invalid for {block}"
            );
        }
    }
}
