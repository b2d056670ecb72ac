//! Query parameter validation for `/analysis`

use crate::pipeline::types::{is_valid_dimension, VALID_DIMENSIONS};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    pub duration: Option<String>,
    pub dimension: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub duration: Duration,
    pub dimension: String,
}

impl AnalysisQuery {
    /// Validate both parameters; the error text is returned to the client as-is
    pub fn validate(&self) -> Result<AnalysisParams, String> {
        let raw_duration = match self.duration.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => return Err("missing required parameter: duration".to_string()),
        };

        let nanos = parse_duration_nanos(raw_duration).ok_or_else(|| {
            format!(
                "invalid duration format: {} (expected format: 5s, 10m, 1h)",
                raw_duration
            )
        })?;

        if nanos <= 0 {
            return Err("duration must be positive".to_string());
        }

        let dimension = match self.dimension.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => return Err("missing required parameter: dimension".to_string()),
        };

        if !is_valid_dimension(dimension) {
            return Err(format!(
                "invalid dimension: {} (must be one of: {})",
                dimension,
                VALID_DIMENSIONS.join(", ")
            ));
        }

        Ok(AnalysisParams {
            duration: Duration::from_nanos(nanos as u64),
            dimension: dimension.to_string(),
        })
    }
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m` into signed nanoseconds.
///
/// Accepts an optional sign followed by one or more `<number><unit>` groups,
/// units being ns, us, µs, ms, s, m and h. A bare `0` is allowed.
pub fn parse_duration_nanos(input: &str) -> Option<i128> {
    let (negative, mut rest) = match input.as_bytes().first()? {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Some(0);
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: f64 = 0.0;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_len];
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return None;
        }
        let value: f64 = number.parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let multiplier = unit_nanos(&rest[..unit_len])?;
        rest = &rest[unit_len..];

        total += value * multiplier;
    }

    // Same ceiling as a signed 64-bit nanosecond count (~292 years)
    if !total.is_finite() || total > i64::MAX as f64 {
        return None;
    }

    let nanos = total.round() as i128;
    Some(if negative { -nanos } else { nanos })
}

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" | "μs" => Some(1e3),
        "ms" => Some(1e6),
        "s" => Some(1e9),
        "m" => Some(60e9),
        "h" => Some(3600e9),
        _ => None,
    }
}
