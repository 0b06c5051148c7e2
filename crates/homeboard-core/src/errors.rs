//! Error types for the synchronization core.
//!
//! Every boundary in the core (fetch, frame decode, render, save) catches
//! its own error and degrades. These types exist so the boundaries can log
//! something structured, and so the CLI can report startup failures.

use homeboard_protocol::{Domain, ProtocolError};

/// A single domain fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned a body that is not JSON: {message}")]
    Malformed { url: String, message: String },

    #[error("upstream error from {url}: {message}")]
    Upstream { url: String, message: String },
}

impl FetchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "fetch_transport",
            FetchError::Status { .. } => "fetch_status",
            FetchError::Malformed { .. } => "fetch_malformed",
            FetchError::Upstream { .. } => "fetch_upstream",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{domain} payload has an unexpected shape: {message}")]
    UnexpectedShape { domain: Domain, message: String },
}

impl RenderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RenderError::UnexpectedShape { .. } => "render_unexpected_shape",
        }
    }
}

/// Why one fetch-and-render run of a domain did not update its widget.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("refresh panicked")]
    Panicked,
}

impl RefreshError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RefreshError::Fetch(e) => e.error_code(),
            RefreshError::Render(e) => e.error_code(),
            RefreshError::Panicked => "refresh_panicked",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to connect to {url}: {message}")]
    ConnectFailed { url: String, message: String },

    #[error("push channel transport error: {message}")]
    Transport { message: String },
}

impl ChannelError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ChannelError::ConnectFailed { .. } => "channel_connect_failed",
            ChannelError::Transport { .. } => "channel_transport",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("domain '{domain}' is already registered")]
    DuplicateDomain { domain: Domain },

    #[error("domain '{domain}' has a zero poll interval")]
    ZeroInterval { domain: Domain },

    #[error("domain '{domain}' is not registered")]
    UnknownDomain { domain: Domain },

    #[error("scheduler is already started")]
    AlreadyStarted,
}

impl SchedulerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SchedulerError::DuplicateDomain { .. } => "scheduler_duplicate_domain",
            SchedulerError::ZeroInterval { .. } => "scheduler_zero_interval",
            SchedulerError::UnknownDomain { .. } => "scheduler_unknown_domain",
            SchedulerError::AlreadyStarted => "scheduler_already_started",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateStoreError {
    #[error("failed to write UI state to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize UI state: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StateStoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StateStoreError::Write { .. } => "state_write_failed",
            StateStoreError::Serialize(_) => "state_serialize_failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no push handler registered for '{tag}' messages")]
    MissingHandler { tag: &'static str },
}

impl DispatchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DispatchError::MissingHandler { .. } => "dispatch_missing_handler",
        }
    }
}

/// Startup failures surfaced to the binary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] homeboard_config::ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    StateStore(#[from] StateStoreError),

    #[error("failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

impl CoreError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Config(e) => e.error_code(),
            CoreError::Protocol(e) => e.error_code(),
            CoreError::Scheduler(e) => e.error_code(),
            CoreError::Dispatch(e) => e.error_code(),
            CoreError::StateStore(e) => e.error_code(),
            CoreError::HttpClient { .. } => "http_client_build_failed",
        }
    }

    pub fn is_user_error(&self) -> bool {
        match self {
            CoreError::Config(e) => e.is_user_error(),
            CoreError::Protocol(e) => e.is_user_error(),
            _ => false,
        }
    }
}
