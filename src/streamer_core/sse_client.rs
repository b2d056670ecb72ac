//! Server-sent event stream reader
//!
//! One [`SseClient::read_events`] call owns one upstream connection. The
//! connection body is moved into a spawned worker which frames it into lines,
//! parses `data: ` lines into posts and pushes them onto a bounded channel.
//!
//! ```text
//! upstream ──HTTP body──▶ worker (frame → filter → parse) ──mpsc(N)──▶ aggregator
//! ```
//!
//! The worker is the only sender, so the channel closes exactly once, when
//! the worker returns (or unwinds). The response body is dropped on the same
//! path, which closes the connection.

use crate::pipeline::types::StreamResult;
use crate::streamer_core::config::{
    RuntimeConfig, DEFAULT_CHANNEL_BUFFER, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_LINE_BYTES,
};
use crate::streamer_core::event_source::EventSource;
use crate::streamer_core::post_parser::{parse_post, ParseError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DATA_PREFIX: &[u8] = b"data: ";

/// Failure to open the stream. No channel exists when this is returned.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),

    #[error("failed to connect to stream: {0}")]
    Request(reqwest::Error),

    #[error("unexpected status code: {0}")]
    Status(StatusCode),

    #[error("failed to connect to stream: cancelled before the connection was established")]
    Cancelled,
}

/// Failure that terminated an open stream. Delivered once, as the last channel item.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream error: parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("stream error: read error: {0}")]
    Transport(reqwest::Error),

    #[error("stream error: read error: line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

/// How the worker stopped
#[derive(Debug)]
enum StreamExit {
    /// Upstream closed the body cleanly
    EndOfStream,
    /// Scope cancelled (deadline or caller); names where the worker noticed
    Cancelled(&'static str),
    /// Nobody is listening any more
    ReceiverClosed,
    Failed(StreamError),
}

#[derive(Debug, Clone)]
pub struct SseClient {
    url: String,
    http: reqwest::Client,
    channel_buffer: usize,
    max_line_bytes: usize,
}

impl SseClient {
    /// Client with default buffering and no read timeout
    pub fn new(url: impl Into<String>) -> Result<Self, ConnectError> {
        Self::with_connect_timeout(url, DEFAULT_CONNECT_TIMEOUT)
    }

    fn with_connect_timeout(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, ConnectError> {
        // Only the connect phase is bounded; the body is read for as long as the scope lives
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ConnectError::Client)?;

        Ok(Self {
            url: url.into(),
            http,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConnectError> {
        Ok(Self::with_connect_timeout(&config.stream_url, config.connect_timeout)?
            .with_channel_buffer(config.channel_buffer)
            .with_max_line_bytes(config.max_line_bytes))
    }

    /// Capacity of the result channel (minimum 1)
    pub fn with_channel_buffer(mut self, channel_buffer: usize) -> Self {
        self.channel_buffer = channel_buffer.max(1);
        self
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn channel_buffer(&self) -> usize {
        self.channel_buffer
    }

    async fn connect(&self, scope: &CancellationToken) -> Result<Response, ConnectError> {
        let request = self
            .http
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send();

        let response = tokio::select! {
            biased;
            _ = scope.cancelled() => return Err(ConnectError::Cancelled),
            result = request => result.map_err(ConnectError::Request)?,
        };

        if response.status() != StatusCode::OK {
            // Dropping the response here releases the connection
            return Err(ConnectError::Status(response.status()));
        }

        Ok(response)
    }
}

#[async_trait]
impl EventSource for SseClient {
    async fn read_events(
        &self,
        scope: CancellationToken,
    ) -> Result<mpsc::Receiver<StreamResult>, ConnectError> {
        let response = self.connect(&scope).await?;

        log::info!("🔌 Stream connection established: {}", self.url);

        let (tx, rx) = mpsc::channel(self.channel_buffer);
        let max_line_bytes = self.max_line_bytes;

        tokio::spawn(async move {
            read_stream(response, tx, scope, max_line_bytes).await;
        });

        Ok(rx)
    }
}

/// Worker body: consume the stream, classify the exit, report failures
async fn read_stream(
    response: Response,
    tx: mpsc::Sender<StreamResult>,
    scope: CancellationToken,
    max_line_bytes: usize,
) {
    match consume_stream(response, &tx, &scope, max_line_bytes).await {
        StreamExit::EndOfStream => {
            log::info!("Stream ended normally (upstream closed the connection)");
        }
        StreamExit::Cancelled(reason) => {
            log::info!("Stream connection stopped: analysis scope cancelled {}", reason);
        }
        StreamExit::ReceiverClosed => {
            log::info!("Stream connection stopped: result receiver dropped");
        }
        StreamExit::Failed(err) => {
            log::error!("❌ Stream error: {}", err);
            // A closed receiver or a finished scope both mean nobody wants it any more
            tokio::select! {
                biased;
                _ = scope.cancelled() => {
                    log::info!("Stream error dropped: analysis scope cancelled before delivery");
                }
                _ = tx.send(Err(err)) => {}
            }
        }
    }
    // tx dropped here: channel closed
}

async fn consume_stream(
    mut response: Response,
    tx: &mpsc::Sender<StreamResult>,
    scope: &CancellationToken,
    max_line_bytes: usize,
) -> StreamExit {
    let mut framer = LineFramer::new(max_line_bytes);

    loop {
        loop {
            let line = match framer.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => return StreamExit::Failed(err),
            };
            if let Some(exit) = handle_line(&line, tx, scope).await {
                return exit;
            }
        }

        let chunk = tokio::select! {
            biased;
            _ = scope.cancelled() => return StreamExit::Cancelled("while waiting for upstream data"),
            chunk = response.chunk() => chunk,
        };

        match chunk {
            Ok(Some(bytes)) => framer.extend(&bytes),
            Ok(None) => {
                if let Some(line) = framer.finish() {
                    if let Some(exit) = handle_line(&line, tx, scope).await {
                        return exit;
                    }
                }
                return StreamExit::EndOfStream;
            }
            Err(err) => {
                if scope.is_cancelled() {
                    return StreamExit::Cancelled("during an interrupted read");
                }
                return StreamExit::Failed(StreamError::Transport(err));
            }
        }
    }
}

/// Process one framed line. Returns `Some` when the worker must stop.
async fn handle_line(
    line: &[u8],
    tx: &mpsc::Sender<StreamResult>,
    scope: &CancellationToken,
) -> Option<StreamExit> {
    if scope.is_cancelled() {
        return Some(StreamExit::Cancelled("between lines"));
    }

    if line.is_empty() {
        return None;
    }

    // event:, id:, retry: and comment lines carry nothing we use
    let event = line.strip_prefix(DATA_PREFIX)?;

    let post = match parse_post(event) {
        Ok(post) => post,
        Err(err) => return Some(StreamExit::Failed(StreamError::Parse(err))),
    };

    // A full buffer must not outlive the scope
    tokio::select! {
        biased;
        _ = scope.cancelled() => Some(StreamExit::Cancelled("while the result buffer was full")),
        sent = tx.send(Ok(post)) => match sent {
            Ok(()) => None,
            Err(_) => Some(StreamExit::ReceiverClosed),
        },
    }
}

/// Splits a byte stream into `\n`-terminated lines, stripping an optional `\r`
#[derive(Debug)]
struct LineFramer {
    buf: Vec<u8>,
    /// Prefix of `buf` already known to contain no newline
    scanned: usize,
    max_line_bytes: usize,
}

impl LineFramer {
    fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_line_bytes,
        }
    }

    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator, `None` if more bytes are needed
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        match self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset;
                let mut line: Vec<u8> = self.buf.drain(..=end).collect();
                self.scanned = 0;
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if line.len() > self.max_line_bytes {
                    return Err(StreamError::LineTooLong {
                        limit: self.max_line_bytes,
                    });
                }
                Ok(Some(line))
            }
            None => {
                self.scanned = self.buf.len();
                // A trailing \r may still turn out to be half of a CRLF
                let pending = self.buf.len() - usize::from(self.buf.last() == Some(&b'\r'));
                if pending > self.max_line_bytes {
                    return Err(StreamError::LineTooLong {
                        limit: self.max_line_bytes,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Unterminated trailing line left when the stream ends
    fn finish(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.buf);
        self.scanned = 0;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }
}
