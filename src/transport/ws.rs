//! # WebSocket transport (`tokio-tungstenite`).
//!
//! Maps WebSocket frames onto the transport boundary:
//!
//! | Frame            | Relay sees                               |
//! |------------------|------------------------------------------|
//! | Text             | one message                              |
//! | Close / EOF      | end of stream                            |
//! | Ping / Pong      | skipped (answered by tungstenite)        |
//! | Binary           | `TransportError::UnsupportedFrame`       |

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::{Connection, MessageSink, MessageSource};
use crate::error::TransportError;

/// An accepted WebSocket connection.
pub struct WsConnection<S> {
    stream: WebSocketStream<S>,
}

impl<S> WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Performs the server-side handshake on a raw stream.
    pub async fn accept(stream: S) -> Result<Self, TransportError> {
        let stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| TransportError::Read {
                error: format!("handshake: {e}"),
            })?;
        Ok(Self { stream })
    }

    /// Wraps an already upgraded stream.
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

impl<S> Connection for WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Source = WsSource<S>;
    type Sink = WsSink<S>;

    fn split(self) -> (WsSource<S>, WsSink<S>) {
        let (sink, stream) = self.stream.split();
        (WsSource { stream }, WsSink { sink })
    }
}

/// Inbound half of [`WsConnection`].
pub struct WsSource<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> MessageSource for WsSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn next_message(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            let frame = match self.stream.next().await {
                None => return Ok(None),
                Some(Ok(frame)) => frame,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::Read {
                        error: e.to_string(),
                    });
                }
            };
            match frame {
                Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
                Message::Binary(_) => {
                    return Err(TransportError::UnsupportedFrame { kind: "binary" });
                }
            }
        }
    }
}

/// Outbound half of [`WsConnection`].
pub struct WsSink<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
}

#[async_trait]
impl<S> MessageSink for WsSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send_message(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::text(text))
            .await
            .map_err(|e| match e {
                WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
                other => TransportError::Write {
                    error: other.to_string(),
                },
            })
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}
