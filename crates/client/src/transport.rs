// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the server push stream.
//!
//! A [`Connector`] opens one subscription and yields a [`Transport`] that
//! produces raw text frames. The connection manager owns at most one live
//! transport at a time. This split enables:
//! - Real WebSocket streams for production
//! - Scripted transports for unit testing

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// The subscription URL could not be built.
    #[error("invalid subscription url: {0}")]
    InvalidUrl(String),
}

impl From<TransportError> for sluice_core::Error {
    fn from(e: TransportError) -> Self {
        sluice_core::Error::Transport(e.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// An open subscription stream.
pub trait Transport: Send {
    /// Receives the next text frame.
    ///
    /// Returns `None` once the server has closed the stream.
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<String>>>;

    /// Closes the stream.
    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>>;
}

/// Opens subscription streams.
pub trait Connector: Send + Sync {
    /// Opens a stream for `url`. The future resolves once the server has
    /// confirmed the subscription.
    fn open(&self, url: &str) -> BoxFuture<'static, TransportResult<Box<dyn Transport>>>;
}

/// Builds the subscription URL for a channel.
///
/// `channelKey` is always set. `resumeToken` is set only when a token is
/// known; without it the server streams from now.
pub fn subscription_url(
    base: &str,
    channel_key: &str,
    resume_token: Option<&str>,
) -> TransportResult<String> {
    let mut url = Url::parse(base).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "channelKey" && k != "resumeToken")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &kept {
            query.append_pair(k, v);
        }
        query.append_pair("channelKey", channel_key);
        if let Some(token) = resume_token {
            query.append_pair("resumeToken", token);
        }
    }

    Ok(url.into())
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    closed: bool,
}

impl Transport for WebSocketTransport {
    fn recv(&mut self) -> BoxFuture<'_, TransportResult<Option<String>>> {
        Box::pin(async move {
            use futures_util::StreamExt;

            if self.closed {
                return Err(TransportError::ConnectionClosed);
            }

            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(Some(text.to_string()));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        self.closed = true;
                        return Ok(None);
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
                        continue;
                    }
                    Some(Err(e)) => {
                        self.closed = true;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            use futures_util::SinkExt;

            if self.closed {
                return Ok(());
            }
            self.closed = true;
            // The peer may already be gone; closing is best-effort.
            let _ = self.sink.close().await;
            Ok(())
        })
    }
}

/// Opens [`WebSocketTransport`]s with tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(&self, url: &str) -> BoxFuture<'static, TransportResult<Box<dyn Transport>>> {
        let url = url.to_string();
        Box::pin(async move {
            use futures_util::StreamExt;

            let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();
            Ok(Box::new(WebSocketTransport {
                sink,
                stream,
                closed: false,
            }) as Box<dyn Transport>)
        })
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
