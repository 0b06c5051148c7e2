use futures::future::BoxFuture;
use futures::stream::{BoxStream, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use crate::errors::ChannelError;

/// Inbound text frames of one open connection. The stream ending means the
/// connection closed.
pub type FrameStream = BoxStream<'static, Result<String, ChannelError>>;

/// Opens push connections. Swapped for an in-memory transport in tests.
pub trait Transport: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, ChannelError>>;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<FrameStream, ChannelError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| ChannelError::ConnectFailed {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

            let frames = ws.filter_map(|item| async move {
                match item {
                    Ok(Message::Text(text)) => Some(Ok(text.to_string())),
                    Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => Some(Ok(text)),
                        Err(_) => {
                            debug!(event = "core.channel.binary_frame_dropped", len = bytes.len());
                            None
                        }
                    },
                    // Ping/pong are answered by tungstenite; close ends the stream.
                    Ok(_) => None,
                    Err(e) => Some(Err(ChannelError::Transport {
                        message: e.to_string(),
                    })),
                }
            });
            Ok(frames.boxed())
        })
    }
}
