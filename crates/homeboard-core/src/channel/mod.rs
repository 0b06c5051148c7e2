//! Push channel: one live WebSocket connection with capped exponential
//! backoff reconnect.

mod backoff;
mod manager;
mod transport;

pub use backoff::{ChannelState, ConnectionState, RetryPolicy};
pub use manager::EventChannel;
pub use transport::{FrameStream, Transport, WsTransport};
