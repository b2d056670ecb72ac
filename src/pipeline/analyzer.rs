//! Analysis orchestration: one deadline-bound stream read folded into one result

use super::scope::DeadlineScope;
use super::types::AnalysisResult;
use crate::aggregator_core::fold_stream;
use crate::streamer_core::event_source::EventSource;
use crate::streamer_core::sse_client::{ConnectError, StreamError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The stream never opened; there is nothing to report
    #[error(transparent)]
    Connection(#[from] ConnectError),

    /// The stream broke mid-window. `result` holds everything folded before the failure.
    #[error("partial results (analyzed {analyzed} posts): {source}")]
    Partial {
        analyzed: u64,
        result: AnalysisResult,
        source: StreamError,
    },
}

impl AnalysisError {
    /// Best-effort result that accompanies a mid-stream failure
    pub fn partial_result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisError::Partial { result, .. } => Some(result),
            AnalysisError::Connection(_) => None,
        }
    }
}

#[async_trait]
pub trait AnalyzerService: Send + Sync {
    /// Analyze posts for `duration`, averaging `dimension`.
    ///
    /// `duration` must be positive and `dimension` one of the valid dimensions;
    /// callers validate both. Cancelling `scope` ends the analysis early with a
    /// normal (non-error) result.
    async fn analyze_posts(
        &self,
        scope: &CancellationToken,
        duration: Duration,
        dimension: &str,
    ) -> Result<AnalysisResult, AnalysisError>;
}

pub struct StreamAnalyzer {
    source: Arc<dyn EventSource>,
}

impl StreamAnalyzer {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl AnalyzerService for StreamAnalyzer {
    async fn analyze_posts(
        &self,
        scope: &CancellationToken,
        duration: Duration,
        dimension: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        // Dropped on every return path, which also stops the reader
        let deadline = DeadlineScope::new(scope, duration);

        let rx = self.source.read_events(deadline.token()).await?;

        let (result, err) = fold_stream(rx, dimension).await;

        match err {
            None => Ok(result),
            Some(source) => Err(AnalysisError::Partial {
                analyzed: result.total_posts,
                result,
                source,
            }),
        }
    }
}
