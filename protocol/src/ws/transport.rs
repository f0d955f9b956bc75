//! Socket transport behind the event client.
//!
//! Connections exchange text frames only. The [`Connector`] trait opens one
//! physical socket and hands back its two halves; [`WebSocketConnector`] is
//! the production implementation over `tokio-tungstenite`. Tests plug in an
//! in-memory connector instead.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::trace;

use super::error::ClientError;

/// Outbound half of a socket.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = ClientError> + Send>>;

/// Inbound half of a socket. The stream ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Opens sockets to a node.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream), ClientError>;
}

/// Websocket connector over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<(FrameSink, FrameStream), ClientError> {
        let (socket, _) = connect_async(url).await.map_err(|e| ClientError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let (write, read) = socket.split();

        let sink = write
            .sink_map_err(|e| ClientError::Transport(e.to_string()))
            .with(|text: String| future::ready(Ok::<_, ClientError>(Message::text(text))));

        // Control frames are answered by tungstenite itself.
        let stream = read.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => Some(
                    String::from_utf8(bytes.to_vec())
                        .map_err(|e| ClientError::Transport(format!("non UTF-8 frame: {e}"))),
                ),
                Ok(other) => {
                    trace!(frame = ?other, "control frame");
                    None
                }
                Err(e) => Some(Err(ClientError::Transport(e.to_string()))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}
