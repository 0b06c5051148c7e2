use std::sync::{Arc, Mutex, RwLock};

use futures::StreamExt;
use homeboard_protocol::decode_frame;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::backoff::{ChannelState, ConnectionState, RetryPolicy};
use super::transport::Transport;
use crate::dispatch::MessageSink;

struct LiveChannel {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Shared {
    url: String,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sink: RwLock<Option<Arc<dyn MessageSink>>>,
    status_tx: watch::Sender<ConnectionState>,
}

/// Owns the single push connection.
///
/// [`EventChannel::connect`] supersedes any earlier channel, so at most one
/// connection loop is alive at a time. The loop reconnects forever with
/// capped exponential backoff until [`EventChannel::shutdown`].
pub struct EventChannel {
    shared: Arc<Shared>,
    live: Mutex<Option<LiveChannel>>,
}

impl EventChannel {
    pub fn new(url: impl Into<String>, transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        let (status_tx, _) = watch::channel(ConnectionState::Closed);
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                transport,
                policy,
                sink: RwLock::new(None),
                status_tx,
            }),
            live: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// Register the receiver of decoded frames, replacing any earlier one.
    pub fn on_message(&self, sink: Arc<dyn MessageSink>) {
        *self.shared.sink.write().unwrap_or_else(|e| e.into_inner()) = Some(sink);
    }

    /// Watch connection state transitions.
    pub fn status(&self) -> watch::Receiver<ConnectionState> {
        self.shared.status_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.status_tx.borrow()
    }

    /// Start the connection loop. Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = live.take() {
            debug!(event = "core.channel.superseded", url = %self.shared.url);
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(self.shared.clone(), cancel.clone()));
        *live = Some(LiveChannel { cancel, handle });
    }

    pub fn shutdown(&self) {
        let live = self
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(live) = live {
            live.cancel.cancel();
            info!(event = "core.channel.shutdown", url = %self.shared.url);
        }
        self.shared.status_tx.send_replace(ConnectionState::Closed);
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        if let Ok(mut live) = self.live.lock()
            && let Some(live) = live.take()
        {
            live.cancel.cancel();
        }
    }
}

impl Shared {
    fn publish(&self, state: ConnectionState) {
        self.status_tx.send_replace(state);
    }

    fn deliver(&self, text: &str) {
        let frame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(
                    event = "core.channel.frame_dropped",
                    error = %e,
                    error_code = e.error_code(),
                );
                return;
            }
        };
        let sink = self
            .sink
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match sink {
            Some(sink) => sink.deliver(frame),
            None => debug!(event = "core.channel.no_sink"),
        }
    }
}

async fn run(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut state = ChannelState::new(shared.policy);

    loop {
        state.begin_connect();
        shared.publish(state.state());
        debug!(event = "core.channel.connecting", url = %shared.url);

        let connected = tokio::select! {
            _ = cancel.cancelled() => return,
            result = shared.transport.connect(&shared.url) => result,
        };

        match connected {
            Ok(mut frames) => {
                state.on_open();
                shared.publish(state.state());
                info!(event = "core.channel.opened", url = %shared.url);

                loop {
                    let next = tokio::select! {
                        _ = cancel.cancelled() => return,
                        next = frames.next() => next,
                    };
                    match next {
                        Some(Ok(text)) => shared.deliver(&text),
                        Some(Err(e)) => {
                            // Errors take the same path as a close.
                            warn!(event = "core.channel.transport_error", error = %e);
                            break;
                        }
                        None => break,
                    }
                }
            }
            Err(e) => {
                warn!(
                    event = "core.channel.connect_failed",
                    url = %shared.url,
                    error = %e,
                );
            }
        }

        let wait = state.on_close();
        shared.publish(state.state());
        info!(
            event = "core.channel.closed",
            retry_in_ms = wait.as_millis() as u64,
        );

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
