//! Core data types shared by the stream reader, aggregator and handler

use crate::streamer_core::sse_client::StreamError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Dimensions that can be averaged over a window.
///
/// The parser only keeps these fields and the handler only accepts these names,
/// so adding a dimension here is the only change needed to support it.
pub const VALID_DIMENSIONS: [&str; 4] = ["likes", "comments", "favorites", "retweets"];

pub fn is_valid_dimension(name: &str) -> bool {
    VALID_DIMENSIONS.contains(&name)
}

/// A single post decoded from one `data:` line of the event stream
#[derive(Debug, Clone, PartialEq)]
pub struct PostPayload {
    /// Source platform tag (the single root key, e.g. "tweet")
    pub kind: String,
    /// Creation time in seconds since epoch, always > 0
    pub timestamp: i64,
    /// Raw values of recognized dimensions found in the post
    pub dimension_fields: HashMap<String, Value>,
}

impl PostPayload {
    /// Value of `dimension` as an unsigned integer.
    ///
    /// Returns `None` when the field is absent or does not hold a
    /// non-negative integer (e.g. `-3`, `1.5`, `"abc"`).
    pub fn dimension_value(&self, dimension: &str) -> Option<u64> {
        match self.dimension_fields.get(dimension)? {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    return Some(v);
                }
                // Integral floats such as 1.0e3 still count
                let f = n.as_f64()?;
                if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
                    Some(f as u64)
                } else {
                    None
                }
            }
            Value::String(s) => s.parse::<u64>().ok(),
            _ => None,
        }
    }
}

/// One item on the reader → aggregator channel: a post or the error that ended the stream
pub type StreamResult = Result<PostPayload, StreamError>;

/// Summary of one analysis window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub total_posts: u64,
    pub minimum_timestamp: i64,
    pub maximum_timestamp: i64,
    /// Rounded mean of the requested dimension; serialized by the handler under `avg_<dimension>`
    #[serde(skip)]
    pub average: u64,
}
