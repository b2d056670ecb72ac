use crate::pipeline::types::StreamResult;
use crate::streamer_core::sse_client::ConnectError;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Producer side of an analysis: opens the upstream and hands back a channel of results
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Connect and start reading in the background.
    ///
    /// Fails without creating a channel when the upstream cannot be reached.
    /// Otherwise the returned receiver yields posts until the stream ends, the
    /// scope is cancelled, or one terminating error has been delivered.
    async fn read_events(
        &self,
        scope: CancellationToken,
    ) -> Result<mpsc::Receiver<StreamResult>, ConnectError>;
}
