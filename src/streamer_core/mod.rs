//! Streamer Core - SSE post stream reader
//!
//! Opens a long-lived `text/event-stream` connection, frames it into lines,
//! and turns every `data: ` line into a [`PostPayload`](crate::pipeline::types::PostPayload)
//! (or a terminal error) on a bounded channel.

pub mod config;
pub mod event_source;
pub mod post_parser;
pub mod sse_client;

pub use config::{ConfigError, RuntimeConfig};
pub use event_source::EventSource;
pub use post_parser::{parse_post, ParseError};
pub use sse_client::{ConnectError, SseClient, StreamError};
