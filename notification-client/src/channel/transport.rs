/// Push transport seam
///
/// The channel manager drives a [`Transport`] rather than a concrete
/// websocket so the connection lifecycle can be exercised in tests with an
/// in-memory fake. The production implementation speaks STOMP frames as
/// text messages over tokio-tungstenite.
use crate::channel::stomp::Frame;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a fresh connection to the push endpoint. Called once per
    /// (re)connection attempt.
    async fn open(&self, url: &str) -> Result<Box<dyn Connection>>;
}

#[async_trait]
pub trait Connection: Send {
    async fn send(&mut self, frame: Frame) -> Result<()>;

    /// Next inbound frame; `Ok(None)` means the peer closed the connection.
    async fn recv(&mut self) -> Result<Option<Frame>>;
}

/// tokio-tungstenite websocket transport
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn Connection>> {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| AppError::Transport(format!("websocket connect failed: {e}")))?;
        Ok(Box::new(WebSocketConnection { stream }))
    }
}

struct WebSocketConnection {
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, frame: Frame) -> Result<()> {
        self.stream
            .send(Message::Text(frame.serialize()))
            .await
            .map_err(|e| AppError::Transport(format!("websocket send failed: {e}")))
    }

    async fn recv(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    // Lone newlines are STOMP heartbeats, not frames
                    if text.trim_matches(['\n', '\r']).is_empty() {
                        continue;
                    }
                    return Frame::parse(&text).map(Some);
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(Message::Binary(_))) => {
                    return Err(AppError::Frame("unexpected binary websocket message".into()))
                }
                Some(Err(e)) => {
                    return Err(AppError::Transport(format!("websocket receive failed: {e}")))
                }
            }
        }
    }
}
