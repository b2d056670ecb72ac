use super::params::AnalysisQuery;
use super::response::{analysis_reply, error_reply, Response};
use super::AppState;
use crate::pipeline::analyzer::AnalysisError;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reject::{InvalidQuery, MethodNotAllowed};
use warp::Rejection;

/// GET /analysis?duration=5s&dimension=likes
///
/// Blocks for the full duration (or until server shutdown).
pub async fn handle_analysis(query: AnalysisQuery, state: AppState) -> Result<Response, Infallible> {
    let params = match query.validate() {
        Ok(params) => params,
        Err(message) => return Ok(error_reply(StatusCode::BAD_REQUEST, message)),
    };

    log::info!(
        "Analysis request started: duration={:?} dimension={}",
        params.duration,
        params.dimension
    );

    let outcome = state
        .analyzer
        .analyze_posts(&state.shutdown, params.duration, &params.dimension)
        .await;

    match outcome {
        Ok(result) => {
            log::info!(
                "✅ Analysis completed: total_posts={} duration={:?} dimension={}",
                result.total_posts,
                params.duration,
                params.dimension
            );
            Ok(analysis_reply(&params.dimension, &result, None))
        }
        Err(err @ AnalysisError::Partial { .. }) => {
            log::warn!("⚠️  Analysis returned partial results: {}", err);
            let result = err.partial_result().copied().unwrap_or_default();
            Ok(analysis_reply(&params.dimension, &result, Some(err.to_string())))
        }
        Err(err @ AnalysisError::Connection(_)) => {
            log::error!("❌ Failed to perform analysis on posts: {}", err);
            Ok(error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to analyze stream",
            ))
        }
    }
}

/// Render every rejection as a JSON error body
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let reply = if err.is_not_found() {
        error_reply(StatusCode::NOT_FOUND, "not found")
    } else if err.find::<MethodNotAllowed>().is_some() {
        error_reply(StatusCode::METHOD_NOT_ALLOWED, "only GET method is allowed")
    } else if let Some(invalid) = err.find::<InvalidQuery>() {
        error_reply(StatusCode::BAD_REQUEST, invalid.to_string())
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        error_reply(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    };
    Ok(reply)
}
