//! homeboard-core: real-time synchronization core for the homeboard dashboard
//!
//! Keeps every widget of a home-automation dashboard current from two
//! sources: a push channel for high-churn domains and a per-domain poll
//! schedule for everything. Also owns the client-only state: countdown
//! timers and the persisted widget collapse map.
//!
//! # Main Entry Points
//!
//! - [`dashboard`] - Wire everything together against a server
//! - [`channel`] - Push connection with capped exponential backoff
//! - [`scheduler`] - Guarded per-domain periodic refresh
//! - [`render`] - Pure payload-to-view functions, one per domain
//! - [`timers`] - Countdown timers with one-shot alarms
//! - [`ui_state`] - Persisted widget collapse state

pub mod actions;
pub mod api;
pub mod board;
pub mod channel;
pub mod clock;
pub mod dashboard;
pub mod dispatch;
pub mod errors;
pub mod logging;
pub mod notifications;
pub mod render;
pub mod scheduler;
pub mod timers;
pub mod ui_state;

pub use actions::{ActionClient, ActionOutcome};
pub use api::{DashboardApi, HttpApi};
pub use board::{BoardEvent, SystemStatus, WidgetBoard};
pub use channel::{ConnectionState, EventChannel, RetryPolicy, Transport, WsTransport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dashboard::{Dashboard, DashboardParts};
pub use dispatch::{Dispatcher, DispatcherBuilder, MessageSink, PushHandler};
pub use errors::{
    ChannelError, CoreError, DispatchError, FetchError, RefreshError, RenderError,
    SchedulerError, StateStoreError,
};
pub use notifications::NotificationCenter;
pub use render::{WidgetView, render};
pub use scheduler::{PollScheduler, RefreshFn, RefreshFuture, RunOutcome};
pub use timers::{AlarmSink, Timer, TimerService, TimerState, TimerSubsystem};
pub use ui_state::{CollapseMap, LocalStateStore, known_widgets};

// Re-export config and protocol types the CLI needs alongside the core
pub use homeboard_config::{ConfigError, HomeboardConfig};
pub use homeboard_protocol::{Action, Domain, TIMERS_WIDGET};

// Re-export logging initialization
pub use logging::init_logging;
