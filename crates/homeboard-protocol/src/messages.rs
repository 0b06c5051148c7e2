use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Domain;
use crate::errors::ProtocolError;
use crate::types::Notification;

/// Tag of every push message the core understands.
///
/// Closed set: adding a variant here forces every handler map to be
/// extended, which the dispatcher checks at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    KanbanUpdate,
    LightsUpdate,
    MediaUpdate,
    Notification,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::KanbanUpdate,
        MessageKind::LightsUpdate,
        MessageKind::MediaUpdate,
        MessageKind::Notification,
    ];

    /// The `"type"` value on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::KanbanUpdate => "kanban_update",
            MessageKind::LightsUpdate => "lights_update",
            MessageKind::MediaUpdate => "media_update",
            MessageKind::Notification => "notification",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// The domain whose widget this message re-renders.
    pub fn domain(self) -> Domain {
        match self {
            MessageKind::KanbanUpdate => Domain::Kanban,
            MessageKind::LightsUpdate => Domain::Lights,
            MessageKind::MediaUpdate => Domain::Media,
            MessageKind::Notification => Domain::Notifications,
        }
    }
}

/// A typed push message. Transient: lives only for the duration of dispatch.
///
/// Update variants carry the full domain payload in the same shape the
/// domain's poll endpoint returns, so the push and poll paths feed the
/// same render function.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    KanbanUpdate(Value),
    LightsUpdate(Value),
    MediaUpdate(Value),
    Notification(Notification),
}

impl InboundMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundMessage::KanbanUpdate(_) => MessageKind::KanbanUpdate,
            InboundMessage::LightsUpdate(_) => MessageKind::LightsUpdate,
            InboundMessage::MediaUpdate(_) => MessageKind::MediaUpdate,
            InboundMessage::Notification(_) => MessageKind::Notification,
        }
    }

    pub fn domain(&self) -> Domain {
        self.kind().domain()
    }

    /// Encode as a wire frame. Used by servers and test fixtures.
    pub fn to_frame_text(&self) -> Result<String, ProtocolError> {
        let data = match self {
            InboundMessage::KanbanUpdate(v)
            | InboundMessage::LightsUpdate(v)
            | InboundMessage::MediaUpdate(v) => v.clone(),
            InboundMessage::Notification(n) => serde_json::to_value(n)?,
        };
        let frame = RawFrame {
            tag: self.kind().tag().to_string(),
            data,
        };
        Ok(serde_json::to_string(&frame)?)
    }
}

/// Result of decoding one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(InboundMessage),
    /// Well-formed frame with a tag the core does not handle (`time`, `pong`, ...).
    Unrecognized { tag: String },
}

#[derive(Serialize, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    data: Value,
}

/// Decode one text frame of shape `{"type": ..., "data": ...}`.
///
/// Unknown tags are not errors. Text that is not a JSON object with a string
/// `type`, an update with a missing or `null` payload, or a `notification`
/// whose payload is not a notification record, is a `ProtocolError`.
pub fn decode_frame(text: &str) -> Result<Frame, ProtocolError> {
    let raw: RawFrame =
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedFrame {
            message: e.to_string(),
        })?;

    let Some(kind) = MessageKind::from_tag(&raw.tag) else {
        return Ok(Frame::Unrecognized { tag: raw.tag });
    };

    if kind != MessageKind::Notification && raw.data.is_null() {
        return Err(ProtocolError::InvalidPayload {
            tag: raw.tag,
            message: "update carries no data".to_string(),
        });
    }

    let message = match kind {
        MessageKind::KanbanUpdate => InboundMessage::KanbanUpdate(raw.data),
        MessageKind::LightsUpdate => InboundMessage::LightsUpdate(raw.data),
        MessageKind::MediaUpdate => InboundMessage::MediaUpdate(raw.data),
        MessageKind::Notification => {
            let notification = serde_json::from_value(raw.data).map_err(|e| {
                ProtocolError::InvalidPayload {
                    tag: raw.tag.clone(),
                    message: e.to_string(),
                }
            })?;
            InboundMessage::Notification(notification)
        }
    };
    Ok(Frame::Message(message))
}
