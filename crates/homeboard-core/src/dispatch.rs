//! Routing of decoded push frames to domain handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use homeboard_protocol::{Frame, InboundMessage, MessageKind};
use tracing::debug;

use crate::errors::DispatchError;

/// Handles one kind of push message.
pub trait PushHandler: Send + Sync {
    fn handle(&self, message: InboundMessage);
}

impl<F> PushHandler for F
where
    F: Fn(InboundMessage) + Send + Sync,
{
    fn handle(&self, message: InboundMessage) {
        self(message)
    }
}

/// Receiver of every decoded frame from the event channel.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, frame: Frame);
}

/// Fixed mapping from message kind to handler.
///
/// Built once at startup; [`DispatcherBuilder::build`] refuses a mapping
/// that leaves any [`MessageKind`] unhandled.
pub struct Dispatcher {
    handlers: BTreeMap<MessageKind, Arc<dyn PushHandler>>,
}

#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: BTreeMap<MessageKind, Arc<dyn PushHandler>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `kind`, replacing any earlier one.
    pub fn on(mut self, kind: MessageKind, handler: Arc<dyn PushHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        if let Some(missing) = MessageKind::ALL
            .into_iter()
            .find(|kind| !self.handlers.contains_key(kind))
        {
            return Err(DispatchError::MissingHandler { tag: missing.tag() });
        }
        Ok(Dispatcher {
            handlers: self.handlers,
        })
    }
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Invoke the handler for a frame. Returns whether a handler ran.
    pub fn dispatch(&self, frame: Frame) -> bool {
        match frame {
            Frame::Message(message) => {
                let kind = message.kind();
                match self.handlers.get(&kind) {
                    Some(handler) => {
                        debug!(event = "core.dispatch.message_routed", kind = kind.tag());
                        handler.handle(message);
                        true
                    }
                    None => false,
                }
            }
            Frame::Unrecognized { tag } => {
                debug!(event = "core.dispatch.unrecognized_dropped", tag = %tag);
                false
            }
        }
    }
}

impl MessageSink for Dispatcher {
    fn deliver(&self, frame: Frame) {
        self.dispatch(frame);
    }
}
