use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Widget id of the client-only timer list. It has no endpoint.
pub const TIMERS_WIDGET: &str = "timers";

/// One independently refreshed data category shown as a widget.
///
/// The slug doubles as the widget id in the collapse map and as the key of
/// the `[poll]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Weather,
    Health,
    Infra,
    Cameras,
    Kanban,
    Scenes,
    Lights,
    Media,
    Activities,
    News,
    Topology,
    Speedtest,
    Notifications,
    Calendar,
    Chat,
}

/// How often a domain's data changes upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Churn {
    High,
    Medium,
    Low,
}

impl fmt::Display for Churn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Churn::High => write!(f, "high"),
            Churn::Medium => write!(f, "medium"),
            Churn::Low => write!(f, "low"),
        }
    }
}

impl Domain {
    pub const ALL: [Domain; 15] = [
        Domain::Weather,
        Domain::Health,
        Domain::Infra,
        Domain::Cameras,
        Domain::Kanban,
        Domain::Scenes,
        Domain::Lights,
        Domain::Media,
        Domain::Activities,
        Domain::News,
        Domain::Topology,
        Domain::Speedtest,
        Domain::Notifications,
        Domain::Calendar,
        Domain::Chat,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Domain::Weather => "weather",
            Domain::Health => "health",
            Domain::Infra => "infra",
            Domain::Cameras => "cameras",
            Domain::Kanban => "kanban",
            Domain::Scenes => "scenes",
            Domain::Lights => "lights",
            Domain::Media => "media",
            Domain::Activities => "activities",
            Domain::News => "news",
            Domain::Topology => "topology",
            Domain::Speedtest => "speedtest",
            Domain::Notifications => "notifications",
            Domain::Calendar => "calendar",
            Domain::Chat => "chat",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.slug() == slug)
    }

    /// GET endpoint, relative to the server base URL.
    pub fn endpoint(self) -> &'static str {
        match self {
            Domain::Weather => "/api/weather",
            Domain::Health => "/api/health",
            Domain::Infra => "/api/infra/status",
            Domain::Cameras => "/api/frigate/events",
            Domain::Kanban => "/api/kanban",
            Domain::Scenes => "/api/ha/scenes",
            Domain::Lights => "/api/ha/lights",
            Domain::Media => "/api/ha/media_players",
            Domain::Activities => "/api/activities",
            Domain::News => "/api/news",
            Domain::Topology => "/api/network/topology",
            Domain::Speedtest => "/api/speedtest/history",
            Domain::Notifications => "/api/notifications",
            Domain::Calendar => "/api/calendar",
            Domain::Chat => "/api/chat/history",
        }
    }

    /// Widget heading.
    pub fn title(self) -> &'static str {
        match self {
            Domain::Weather => "Weather",
            Domain::Health => "System Health",
            Domain::Infra => "Infrastructure",
            Domain::Cameras => "Security Events",
            Domain::Kanban => "Task Board",
            Domain::Scenes => "Scenes",
            Domain::Lights => "Lights",
            Domain::Media => "Media",
            Domain::Activities => "Activities",
            Domain::News => "News",
            Domain::Topology => "Network",
            Domain::Speedtest => "Speed Test",
            Domain::Notifications => "Notifications",
            Domain::Calendar => "Calendar",
            Domain::Chat => "Chat",
        }
    }

    pub fn churn(self) -> Churn {
        match self {
            Domain::Lights | Domain::Media | Domain::Notifications | Domain::Cameras => Churn::High,
            Domain::Infra | Domain::Topology | Domain::Kanban | Domain::Health | Domain::Chat => {
                Churn::Medium
            }
            Domain::Weather
            | Domain::Scenes
            | Domain::News
            | Domain::Activities
            | Domain::Speedtest
            | Domain::Calendar => Churn::Low,
        }
    }

    /// Default poll cadence. A tuning parameter, overridable in config.
    pub fn default_interval(self) -> Duration {
        let secs = match self {
            Domain::Lights | Domain::Media => 10,
            Domain::Notifications | Domain::Cameras => 15,
            Domain::Infra | Domain::Kanban | Domain::Chat => 30,
            Domain::Topology | Domain::Health => 60,
            Domain::Calendar => 5 * 60,
            Domain::Weather | Domain::Speedtest => 10 * 60,
            Domain::News => 15 * 60,
            Domain::Scenes | Domain::Activities => 30 * 60,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Domain {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::from_slug(s).ok_or_else(|| ProtocolError::UnknownDomain {
            slug: s.to_string(),
        })
    }
}
