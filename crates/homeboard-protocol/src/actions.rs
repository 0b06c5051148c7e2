use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::Domain;
use crate::errors::ProtocolError;

/// Target state for a room light toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightMode {
    On,
    Off,
    #[default]
    Toggle,
}

impl LightMode {
    fn as_str(self) -> &'static str {
        match self {
            LightMode::On => "on",
            LightMode::Off => "off",
            LightMode::Toggle => "toggle",
        }
    }
}

impl FromStr for LightMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(LightMode::On),
            "off" => Ok(LightMode::Off),
            "toggle" => Ok(LightMode::Toggle),
            _ => Err(ProtocolError::UnknownLightMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// Media player transport command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCommand {
    PlayPause,
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
    Mute,
}

impl MediaCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaCommand::PlayPause => "play_pause",
            MediaCommand::Play => "play",
            MediaCommand::Pause => "pause",
            MediaCommand::Stop => "stop",
            MediaCommand::Next => "next",
            MediaCommand::Previous => "previous",
            MediaCommand::VolumeUp => "volume_up",
            MediaCommand::VolumeDown => "volume_down",
            MediaCommand::Mute => "mute",
        }
    }
}

impl fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string())).map_err(|_| {
            ProtocolError::UnknownMediaCommand {
                command: s.to_string(),
            }
        })
    }
}

/// A user intent posted to the server.
///
/// Fire-and-forget from the core's standpoint: the response body is not
/// rendered. Each action names the domain(s) to refresh afterwards so the
/// optimistic UI reconciles with server truth.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    TriggerScene { entity_id: String },
    ToggleLights { room: String, mode: LightMode },
    MediaControl { entity_id: String, command: MediaCommand },
    SendChat { message: String },
    MarkNotificationRead { id: String },
    RunSpeedtest,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::TriggerScene { .. } => "trigger_scene",
            Action::ToggleLights { .. } => "toggle_lights",
            Action::MediaControl { .. } => "media_control",
            Action::SendChat { .. } => "send_chat",
            Action::MarkNotificationRead { .. } => "mark_notification_read",
            Action::RunSpeedtest => "run_speedtest",
        }
    }

    /// POST path relative to the server base URL.
    pub fn path(&self) -> String {
        match self {
            Action::TriggerScene { entity_id } => format!("/api/ha/scene/{entity_id}"),
            Action::ToggleLights { .. } => "/api/ha/light/toggle".to_string(),
            Action::MediaControl { .. } => "/api/ha/media/control".to_string(),
            Action::SendChat { .. } => "/api/chat".to_string(),
            Action::MarkNotificationRead { id } => format!("/api/notifications/{id}/read"),
            Action::RunSpeedtest => "/api/speedtest/run".to_string(),
        }
    }

    /// JSON body, if the endpoint takes one.
    pub fn body(&self) -> Option<Value> {
        match self {
            Action::ToggleLights { room, mode } => {
                Some(json!({ "room": room, "action": mode.as_str() }))
            }
            Action::MediaControl { entity_id, command } => {
                Some(json!({ "entity_id": entity_id, "action": command.as_str() }))
            }
            Action::SendChat { message } => Some(json!({ "message": message.trim() })),
            Action::TriggerScene { .. }
            | Action::MarkNotificationRead { .. }
            | Action::RunSpeedtest => None,
        }
    }

    /// Domains refreshed out of cycle once the action has been sent.
    pub fn reconcile_domains(&self) -> &'static [Domain] {
        match self {
            // Scenes usually switch lights too.
            Action::TriggerScene { .. } => &[Domain::Scenes, Domain::Lights],
            Action::ToggleLights { .. } => &[Domain::Lights],
            Action::MediaControl { .. } => &[Domain::Media],
            Action::SendChat { .. } => &[Domain::Chat],
            Action::MarkNotificationRead { .. } => &[Domain::Notifications],
            Action::RunSpeedtest => &[Domain::Speedtest],
        }
    }

    /// Reject input outside accepted constraints before anything is sent.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let reason = match self {
            Action::TriggerScene { entity_id } if entity_id.trim().is_empty() => {
                Some("entity_id is empty")
            }
            Action::ToggleLights { room, .. } if room.trim().is_empty() => Some("room is empty"),
            Action::MediaControl { entity_id, .. } if entity_id.trim().is_empty() => {
                Some("entity_id is empty")
            }
            Action::SendChat { message } if message.trim().is_empty() => Some("message is empty"),
            Action::MarkNotificationRead { id } if id.trim().is_empty() => Some("id is empty"),
            _ => None,
        };
        match reason {
            Some(reason) => Err(ProtocolError::InvalidAction {
                action: self.name(),
                reason,
            }),
            None => Ok(()),
        }
    }
}
