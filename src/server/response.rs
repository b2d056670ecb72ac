use crate::pipeline::types::AnalysisResult;
use serde::Serialize;
use serde_json::{Map, Value};
use warp::http::StatusCode;
use warp::reply::{self, Json, WithStatus};

pub type Response = WithStatus<Json>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `{"error": message}` with the given status
pub fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: message.into(),
    };
    reply::with_status(reply::json(&body), status)
}

/// Success body; the average is keyed by the dimension (`avg_likes`, ...)
pub fn analysis_body(dimension: &str, result: &AnalysisResult, partial_error: Option<String>) -> Value {
    let mut body = Map::new();
    body.insert("total_posts".to_string(), Value::from(result.total_posts));
    body.insert("minimum_timestamp".to_string(), Value::from(result.minimum_timestamp));
    body.insert("maximum_timestamp".to_string(), Value::from(result.maximum_timestamp));
    body.insert(format!("avg_{}", dimension), Value::from(result.average));
    if let Some(message) = partial_error {
        body.insert("partial_error".to_string(), Value::from(message));
    }
    Value::Object(body)
}

pub fn analysis_reply(dimension: &str, result: &AnalysisResult, partial_error: Option<String>) -> Response {
    reply::with_status(
        reply::json(&analysis_body(dimension, result, partial_error)),
        StatusCode::OK,
    )
}
