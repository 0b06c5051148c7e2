//! Configuration types.
//!
//! Every field is `Option<T>` so that the user and project files merge
//! field by field: only values that are explicitly set override a
//! lower-priority file. Accessors supply the defaults.
//!
//! # Example
//!
//! ```toml
//! [server]
//! base_url = "http://dashboard.lan:8000"
//! push_path = "/ws"
//! request_timeout_secs = 10
//! action_timeout_secs = 180
//!
//! [channel]
//! retry_floor_ms = 1000
//! retry_ceiling_ms = 30000
//!
//! [poll]
//! lights = 5
//! weather = 900
//!
//! [timers]
//! max_minutes = 180
//!
//! [ui]
//! always_visible = "cameras"
//! action_refresh_delay_ms = 500
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use homeboard_protocol::Domain;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_PUSH_PATH: &str = "/ws";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_RETRY_FLOOR_MS: u64 = 1_000;
pub const DEFAULT_RETRY_CEILING_MS: u64 = 30_000;
pub const DEFAULT_MAX_TIMER_MINUTES: u32 = 180;
pub const DEFAULT_ALWAYS_VISIBLE: &str = "cameras";
pub const DEFAULT_ACTION_REFRESH_DELAY_MS: u64 = 500;

/// Top-level configuration, one field per TOML section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeboardConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub timers: TimersConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the dashboard server lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP base URL for polls and actions.
    /// Default: "http://localhost:8000"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Path of the push channel on the same host.
    /// Default: "/ws"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_path: Option<String>,

    /// Per-request timeout for polls.
    /// Default: 10 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Per-request timeout for action POSTs. Speed tests and chat replies
    /// hold the request open until the server has the result.
    /// Default: 180 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_timeout_secs: Option<u64>,
}

impl ServerConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn push_path(&self) -> &str {
        self.push_path.as_deref().unwrap_or(DEFAULT_PUSH_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(
            self.action_timeout_secs
                .unwrap_or(DEFAULT_ACTION_TIMEOUT_SECS),
        )
    }

    /// Push channel URL: the base URL with `http`/`https` swapped for
    /// `ws`/`wss`, followed by the push path.
    pub fn push_url(&self) -> Result<String, ConfigError> {
        let base = self.base_url();
        let rest = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ConfigError::InvalidConfiguration {
                message: format!("server.base_url '{base}' must start with http:// or https://"),
            });
        };
        Ok(format!("{rest}{}", self.push_path()))
    }
}

/// Reconnect backoff for the push channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Delay after the first close, and the value restored on every open.
    /// Default: 1000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_floor_ms: Option<u64>,

    /// Upper bound for the doubled delay.
    /// Default: 30000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_ceiling_ms: Option<u64>,
}

impl ChannelConfig {
    pub fn retry_floor(&self) -> Duration {
        Duration::from_millis(self.retry_floor_ms.unwrap_or(DEFAULT_RETRY_FLOOR_MS))
    }

    pub fn retry_ceiling(&self) -> Duration {
        Duration::from_millis(self.retry_ceiling_ms.unwrap_or(DEFAULT_RETRY_CEILING_MS))
    }
}

/// Per-domain poll cadence overrides in seconds, keyed by domain slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollConfig {
    pub overrides: BTreeMap<String, u64>,
}

impl PollConfig {
    /// Configured cadence for `domain`, falling back to its built-in default.
    pub fn interval_for(&self, domain: Domain) -> Duration {
        self.overrides
            .get(domain.slug())
            .map(|secs| Duration::from_secs(*secs))
            .unwrap_or_else(|| domain.default_interval())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimersConfig {
    /// Largest accepted timer duration.
    /// Default: 180 minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_minutes: Option<u32>,
}

impl TimersConfig {
    pub fn max_minutes(&self) -> u32 {
        self.max_minutes.unwrap_or(DEFAULT_MAX_TIMER_MINUTES)
    }
}

/// Widget layout and action behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Widget that is always expanded, whatever the stored collapse state says.
    /// Default: "cameras"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_visible: Option<String>,

    /// Collapse-state file. Default: `~/.homeboard/ui_state.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,

    /// Wait between sending an action and refreshing its domains.
    /// Default: 500ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_refresh_delay_ms: Option<u64>,
}

impl UiConfig {
    pub fn always_visible(&self) -> &str {
        self.always_visible
            .as_deref()
            .unwrap_or(DEFAULT_ALWAYS_VISIBLE)
    }

    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    pub fn action_refresh_delay(&self) -> Duration {
        Duration::from_millis(
            self.action_refresh_delay_ms
                .unwrap_or(DEFAULT_ACTION_REFRESH_DELAY_MS),
        )
    }
}
