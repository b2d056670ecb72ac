//! Mock SSE upstream for integration tests
//!
//! Speaks just enough HTTP/1.1 for reqwest: reads the request head, writes a
//! fixed response and either closes or holds the socket until the client hangs up.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with an event-stream body written chunk by chunk
    Events { chunks: Vec<String>, hold_open: bool },
    /// Bare status line, empty body
    Status(u16),
    /// 200 announcing `content_length` bytes, then closing after `body`
    Truncated { body: String, content_length: usize },
}

impl Reply {
    pub fn closing(lines: &[String]) -> Self {
        Reply::Events {
            chunks: vec![lines.concat()],
            hold_open: false,
        }
    }

    pub fn holding(lines: &[String]) -> Self {
        Reply::Events {
            chunks: vec![lines.concat()],
            hold_open: true,
        }
    }
}

pub struct MockSseServer {
    pub url: String,
    /// Raw request head of every accepted connection
    pub requests: mpsc::UnboundedReceiver<String>,
    /// One message each time a held connection is closed by the client
    pub disconnects: mpsc::UnboundedReceiver<()>,
}

pub async fn start(reply: Reply) -> MockSseServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (request_tx, requests) = mpsc::unbounded_channel();
    let (disconnect_tx, disconnects) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(serve(
                socket,
                reply.clone(),
                request_tx.clone(),
                disconnect_tx.clone(),
            ));
        }
    });

    MockSseServer {
        url: format!("http://{}/stream", addr),
        requests,
        disconnects,
    }
}

/// Address that refuses connections
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn post_line(kind: &str, timestamp: i64, likes: u64) -> String {
    format!(
        "data: {{\"{}\":{{\"timestamp\":{},\"likes\":{}}}}}\n",
        kind, timestamp, likes
    )
}

async fn serve(
    mut socket: TcpStream,
    reply: Reply,
    request_tx: mpsc::UnboundedSender<String>,
    disconnect_tx: mpsc::UnboundedSender<()>,
) {
    let head = match read_request_head(&mut socket).await {
        Some(head) => head,
        None => return,
    };
    let _ = request_tx.send(head);

    match reply {
        Reply::Status(code) => {
            let response = format!(
                "HTTP/1.1 {} Mock\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                code
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        Reply::Truncated {
            body,
            content_length,
        } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\n\
                 Content-Type: text/event-stream\r\n\
                 Content-Length: {}\r\n\r\n",
                content_length
            );
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.write_all(body.as_bytes()).await;
            let _ = socket.flush().await;
            // Give the client time to consume what was sent before the cut
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            let _ = socket.shutdown().await;
        }
        Reply::Events { chunks, hold_open } => {
            let head = "HTTP/1.1 200 OK\r\n\
                        Content-Type: text/event-stream\r\n\
                        Cache-Control: no-cache\r\n\
                        Connection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for chunk in chunks {
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    let _ = disconnect_tx.send(());
                    return;
                }
                let _ = socket.flush().await;
            }

            if hold_open {
                let mut buf = [0u8; 256];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                let _ = disconnect_tx.send(());
            } else {
                let _ = socket.shutdown().await;
            }
        }
    }
}

async fn read_request_head(socket: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..n]);
    }
    Some(String::from_utf8_lossy(&head).into_owned())
}
