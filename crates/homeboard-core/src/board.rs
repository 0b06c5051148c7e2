//! Latest view of every widget plus the system status indicator.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use crate::channel::ConnectionState;
use crate::render::WidgetView;

const EVENT_CAPACITY: usize = 256;

/// The single global failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    Online,
    Reconnecting,
}

impl From<ConnectionState> for SystemStatus {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Open => SystemStatus::Online,
            ConnectionState::Connecting | ConnectionState::Closed => SystemStatus::Reconnecting,
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Online => write!(f, "ONLINE"),
            SystemStatus::Reconnecting => write!(f, "RECONNECTING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    WidgetChanged(WidgetView),
    StatusChanged(SystemStatus),
}

struct BoardState {
    widgets: BTreeMap<String, WidgetView>,
    status: SystemStatus,
}

/// Holds what the screen shows.
///
/// Each widget entry is only ever replaced whole. Subscribers hear about a
/// change only when the stored view actually differs, so re-applying the
/// same data is invisible.
pub struct WidgetBoard {
    state: Mutex<BoardState>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for WidgetBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetBoard {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(BoardState {
                widgets: BTreeMap::new(),
                status: SystemStatus::Reconnecting,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    /// Replace a widget's view. Returns whether anything changed.
    ///
    /// The event is sent while the state lock is held, so subscribers see
    /// changes in the order they were stored.
    pub fn apply(&self, view: WidgetView) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.widgets.get(&view.widget) == Some(&view) {
            debug!(event = "core.board.apply_unchanged", widget = %view.widget);
            return false;
        }
        state.widgets.insert(view.widget.clone(), view.clone());

        // No subscribers is fine.
        let _ = self.events.send(BoardEvent::WidgetChanged(view));
        true
    }

    pub fn set_status(&self, status: SystemStatus) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.status == status {
            return false;
        }
        state.status = status;
        let _ = self.events.send(BoardEvent::StatusChanged(status));
        true
    }

    pub fn status(&self) -> SystemStatus {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).status
    }

    pub fn view(&self, widget: &str) -> Option<WidgetView> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .widgets
            .get(widget)
            .cloned()
    }

    /// Every widget view, ordered by widget id.
    pub fn snapshot(&self) -> Vec<WidgetView> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .widgets
            .values()
            .cloned()
            .collect()
    }
}
