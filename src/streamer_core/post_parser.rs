//! Decoding of a single event payload into a [`PostPayload`]
//!
//! Payloads have a dynamic shape: the only root key names the platform and
//! its value holds the post itself.
//!
//! ```text
//! {"tweet": {"timestamp": 1554324856, "likes": 636938, "id": "..."}}
//! ```

use crate::pipeline::types::{PostPayload, VALID_DIMENSIONS};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to unmarshal post payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected single root key, got {0}")]
    RootKeyCount(usize),

    #[error("failed to unmarshal {0} data: expected a JSON object")]
    NotAnObject(String),

    #[error("missing timestamp field")]
    MissingTimestamp,

    #[error("invalid timestamp format: {0}")]
    InvalidTimestamp(String),

    #[error("timestamp must be positive, got {0}")]
    NonPositiveTimestamp(i64),
}

/// Parse one event payload (the text after the `data: ` prefix)
pub fn parse_post(event: &[u8]) -> Result<PostPayload, ParseError> {
    let root: Map<String, Value> = serde_json::from_slice(event)?;

    if root.len() != 1 {
        return Err(ParseError::RootKeyCount(root.len()));
    }

    let Some((kind, body)) = root.into_iter().next() else {
        return Err(ParseError::RootKeyCount(0));
    };

    let Value::Object(mut details) = body else {
        return Err(ParseError::NotAnObject(kind));
    };

    let timestamp = extract_timestamp(&details)?;

    let mut dimension_fields = HashMap::new();
    for dim in VALID_DIMENSIONS {
        if let Some(value) = details.remove(dim) {
            dimension_fields.insert(dim.to_string(), value);
        }
    }

    Ok(PostPayload {
        kind,
        timestamp,
        dimension_fields,
    })
}

/// JSON numbers carry no integer/float distinction, so float timestamps are
/// rounded (ties to even) before the range and sign checks.
fn extract_timestamp(details: &Map<String, Value>) -> Result<i64, ParseError> {
    let raw = details.get("timestamp").ok_or(ParseError::MissingTimestamp)?;

    let Value::Number(number) = raw else {
        return Err(ParseError::InvalidTimestamp(format!(
            "expected a number, got {}",
            raw
        )));
    };

    let timestamp = if let Some(ts) = number.as_i64() {
        ts
    } else if number.is_u64() {
        return Err(ParseError::InvalidTimestamp(format!("{} is out of range", number)));
    } else {
        let rounded = number.as_f64().unwrap_or(f64::NAN).round_ties_even();
        // i64::MAX is not representable as f64; 2^63 is the first value out of range
        if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= 9_223_372_036_854_775_808.0 {
            return Err(ParseError::InvalidTimestamp(format!("{} is out of range", number)));
        }
        rounded as i64
    };

    if timestamp <= 0 {
        return Err(ParseError::NonPositiveTimestamp(timestamp));
    }

    Ok(timestamp)
}
