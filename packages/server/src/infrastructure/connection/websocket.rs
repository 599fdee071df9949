//! WebSocket implementation of the peer connection capabilities.

use std::future::Future;

use async_trait::async_trait;
use axum::{
    extract::ws::{CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade, close_code},
    response::Response,
};
use bytes::Bytes;
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::time::Instant;

use super::{ConnectionConfig, framing::decode_text_frame};
use crate::domain::{ConnectionUpgrade, Message, PeerReader, PeerWriter, TransportError};

/// Split a socket into the halves the pump drives.
pub fn split(socket: WebSocket, config: ConnectionConfig) -> (WebSocketReader, WebSocketWriter) {
    let (sink, stream) = socket.split();
    let reader = WebSocketReader {
        stream,
        config,
        deadline: Instant::now() + config.pong_wait,
    };
    (reader, WebSocketWriter { sink })
}

pub struct WebSocketReader {
    stream: SplitStream<WebSocket>,
    config: ConnectionConfig,
    deadline: Instant,
}

#[async_trait]
impl PeerReader for WebSocketReader {
    async fn receive(&mut self) -> Result<Message, TransportError> {
        loop {
            let next = tokio::time::timeout_at(self.deadline, self.stream.next())
                .await
                .map_err(|_| TransportError::Timeout)?;

            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(TransportError::Protocol(e.to_string())),
                None => return Err(TransportError::Closed),
            };

            match frame {
                WsMessage::Text(text) => {
                    return decode_text_frame(text.as_str(), self.config.max_frame_bytes);
                }
                WsMessage::Pong(_) => {
                    self.deadline = Instant::now() + self.config.pong_wait;
                }
                // answered by the protocol layer
                WsMessage::Ping(_) => {}
                WsMessage::Binary(_) => return Err(TransportError::UnsupportedFrame("binary")),
                WsMessage::Close(_) => return Err(TransportError::Closed),
            }
        }
    }
}

pub struct WebSocketWriter {
    sink: SplitSink<WebSocket, WsMessage>,
}

impl WebSocketWriter {
    async fn write(&mut self, frame: WsMessage) -> Result<(), TransportError> {
        self.sink
            .send(frame)
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl PeerWriter for WebSocketWriter {
    async fn send(&mut self, message: Message) -> Result<(), TransportError> {
        self.write(encode_frame(message)).await
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.write(WsMessage::Ping(Bytes::new())).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.write(WsMessage::Close(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "".into(),
        })))
        .await
    }
}

/// Outbound payloads go out as text; anything that is not UTF-8 falls back
/// to a binary frame rather than being mangled.
fn encode_frame(message: Message) -> WsMessage {
    match std::str::from_utf8(message.as_bytes()) {
        Ok(text) => WsMessage::Text(text.into()),
        Err(_) => WsMessage::Binary(message.into_bytes()),
    }
}

/// [`ConnectionUpgrade`] for an axum WebSocket upgrade request.
pub struct WebSocketUpgrader {
    upgrade: WebSocketUpgrade,
    config: ConnectionConfig,
}

impl WebSocketUpgrader {
    pub fn new(upgrade: WebSocketUpgrade, config: ConnectionConfig) -> Self {
        Self { upgrade, config }
    }
}

impl ConnectionUpgrade for WebSocketUpgrader {
    type Reader = WebSocketReader;
    type Writer = WebSocketWriter;
    type Response = Response;

    fn upgrade<F, Fut>(self, on_connected: F) -> Response
    where
        F: FnOnce(WebSocketReader, WebSocketWriter) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let config = self.config;
        self.upgrade
            .max_message_size(config.max_frame_bytes)
            .max_frame_size(config.max_frame_bytes)
            .on_failed_upgrade(|e: axum::Error| {
                tracing::warn!("websocket upgrade failed: {}", e)
            })
            .on_upgrade(move |socket| {
                let (reader, writer) = split(socket, config);
                on_connected(reader, writer)
            })
    }
}
