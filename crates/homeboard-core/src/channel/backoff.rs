use std::fmt;
use std::time::Duration;

/// Lifecycle of the push channel as seen by the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

/// Reconnect delay bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub floor: Duration,
    pub ceiling: Duration,
}

impl RetryPolicy {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self { floor, ceiling }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            floor: Duration::from_secs(1),
            ceiling: Duration::from_secs(30),
        }
    }
}

/// Connection state and retry delay, mutated only through the
/// open/close transitions below.
#[derive(Debug, Clone)]
pub struct ChannelState {
    state: ConnectionState,
    retry_delay: Duration,
    policy: RetryPolicy,
}

impl ChannelState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Closed,
            retry_delay: policy.floor.min(policy.ceiling),
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Delay the next close will wait before reconnecting.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Open;
        self.retry_delay = self.policy.floor.min(self.policy.ceiling);
    }

    /// Mark the channel closed and return how long to wait before the next
    /// attempt. The stored delay doubles for the attempt after that.
    pub fn on_close(&mut self) -> Duration {
        self.state = ConnectionState::Closed;
        let wait = self.retry_delay;
        self.retry_delay = wait.saturating_mul(2).min(self.policy.ceiling);
        wait
    }
}
