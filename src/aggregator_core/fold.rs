use super::running_stats::RunningStatistics;
use crate::pipeline::types::{AnalysisResult, StreamResult};
use crate::streamer_core::sse_client::StreamError;
use tokio::sync::mpsc;

/// Consume the result channel until it closes or delivers an error.
///
/// Applies no timeout of its own: the producer closes the channel when the
/// analysis scope ends. On error the remaining items are left unread and the
/// statistics gathered so far are returned alongside it.
pub async fn fold_stream(
    mut rx: mpsc::Receiver<StreamResult>,
    dimension: &str,
) -> (AnalysisResult, Option<StreamError>) {
    let mut stats = RunningStatistics::new(dimension);

    while let Some(item) = rx.recv().await {
        match item {
            Ok(post) => stats.process_post(&post),
            Err(err) => {
                log::error!(
                    "Stream error during analysis: {} (posts_processed={})",
                    err,
                    stats.total_posts()
                );
                return (stats.to_result(), Some(err));
            }
        }
    }

    (stats.to_result(), None)
}
