//! Wiring of the whole core: one board, one push channel, one scheduler.
//!
//! Every domain widget refreshes on the union of its poll interval and
//! push messages for its domain. Both paths render through the same pure
//! function and land on the same board entry.

use std::sync::{Arc, Mutex};

use futures::FutureExt;
use homeboard_config::HomeboardConfig;
use homeboard_protocol::{Domain, InboundMessage, MessageKind, NotificationList};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::actions::ActionClient;
use crate::api::{DashboardApi, HttpApi};
use crate::board::{SystemStatus, WidgetBoard};
use crate::channel::{EventChannel, RetryPolicy, Transport, WsTransport};
use crate::clock::{Clock, SystemClock};
use crate::dispatch::{Dispatcher, PushHandler};
use crate::errors::{CoreError, RenderError};
use crate::notifications::NotificationCenter;
use crate::render::{parse, render};
use crate::scheduler::{PollScheduler, RefreshFn, RefreshFuture};
use crate::timers::{AlarmSink, TimerService, TimerSubsystem};
use crate::ui_state::{CollapseMap, LocalStateStore};

/// Replaceable collaborators. Production uses [`Dashboard::from_config`].
pub struct DashboardParts {
    pub api: Arc<dyn DashboardApi>,
    pub transport: Arc<dyn Transport>,
    pub push_url: String,
    pub clock: Arc<dyn Clock>,
    pub alarm: Arc<dyn AlarmSink>,
}

pub struct Dashboard {
    board: Arc<WidgetBoard>,
    center: Arc<Mutex<NotificationCenter>>,
    scheduler: Arc<PollScheduler>,
    channel: EventChannel,
    timers: TimerService,
    actions: ActionClient,
    state_store: LocalStateStore,
    cancel: CancellationToken,
    status_task: Mutex<Option<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build against the configured server over HTTP and WebSocket.
    pub fn from_config(
        config: &HomeboardConfig,
        alarm: Arc<dyn AlarmSink>,
    ) -> Result<Self, CoreError> {
        let api = HttpApi::new(
            config.server.base_url(),
            config.server.request_timeout(),
            config.server.action_timeout(),
        )?;
        let parts = DashboardParts {
            api: Arc::new(api),
            transport: Arc::new(WsTransport),
            push_url: config.server.push_url()?,
            clock: Arc::new(SystemClock),
            alarm,
        };
        Self::with_parts(config, parts)
    }

    pub fn with_parts(config: &HomeboardConfig, parts: DashboardParts) -> Result<Self, CoreError> {
        let board = Arc::new(WidgetBoard::new());
        let center = Arc::new(Mutex::new(NotificationCenter::new()));

        let mut scheduler = PollScheduler::new();
        for domain in Domain::ALL {
            scheduler.register(
                domain,
                config.poll.interval_for(domain),
                refresh_fn(domain, parts.api.clone(), board.clone(), center.clone()),
            )?;
        }
        let scheduler = Arc::new(scheduler);

        let dispatcher = push_dispatcher(board.clone(), center.clone())?;
        let channel = EventChannel::new(
            parts.push_url,
            parts.transport,
            RetryPolicy::new(config.channel.retry_floor(), config.channel.retry_ceiling()),
        );
        channel.on_message(Arc::new(dispatcher));

        let timers = TimerService::new(
            TimerSubsystem::new(parts.clock, parts.alarm, config.timers.max_minutes()),
            board.clone(),
        );

        let actions = ActionClient::new(
            parts.api,
            scheduler.clone(),
            center.clone(),
            board.clone(),
            config.ui.action_refresh_delay(),
        );

        let state_store = LocalStateStore::from_config(&config.ui);

        Ok(Self {
            board,
            center,
            scheduler,
            channel,
            timers,
            actions,
            state_store,
            cancel: CancellationToken::new(),
            status_task: Mutex::new(None),
        })
    }

    /// Load the collapse state, open the push channel, then start polling.
    /// Returns the collapse state to display with.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<CollapseMap, CoreError> {
        let collapse = self.state_store.effective();

        self.board
            .set_status(SystemStatus::from(self.channel.state()));
        let mut status = self.channel.status();
        let board = self.board.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = *status.borrow_and_update();
                        board.set_status(SystemStatus::from(state));
                    }
                }
            }
        });
        *self.status_task.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);

        self.channel.connect();
        self.scheduler.start()?;
        info!(
            event = "core.dashboard.started",
            push_url = %self.channel.url(),
        );
        Ok(collapse)
    }

    pub fn board(&self) -> &Arc<WidgetBoard> {
        &self.board
    }

    pub fn scheduler(&self) -> &Arc<PollScheduler> {
        &self.scheduler
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    pub fn timers(&self) -> &TimerService {
        &self.timers
    }

    pub fn actions(&self) -> &ActionClient {
        &self.actions
    }

    pub fn state_store(&self) -> &LocalStateStore {
        &self.state_store
    }

    pub fn unread_notifications(&self) -> usize {
        self.center
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .unread_count()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.scheduler.shutdown();
        self.channel.shutdown();
        self.timers.shutdown();
        self.status_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        info!(event = "core.dashboard.shutdown");
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn refresh_fn(
    domain: Domain,
    api: Arc<dyn DashboardApi>,
    board: Arc<WidgetBoard>,
    center: Arc<Mutex<NotificationCenter>>,
) -> RefreshFn {
    Arc::new(move || -> RefreshFuture {
        let fetch = api.fetch(domain);
        let board = board.clone();
        let center = center.clone();
        async move {
            let payload = fetch.await?;
            let view = if domain == Domain::Notifications {
                let list = notification_list(&payload)?;
                let mut center = center.lock().unwrap_or_else(|e| e.into_inner());
                center.replace_all(list);
                center.view()
            } else {
                render(domain, &payload)?
            };
            board.apply(view);
            Ok(())
        }
        .boxed()
    })
}

fn notification_list(payload: &Value) -> Result<NotificationList, RenderError> {
    parse(Domain::Notifications, payload)
}

fn push_dispatcher(
    board: Arc<WidgetBoard>,
    center: Arc<Mutex<NotificationCenter>>,
) -> Result<Dispatcher, CoreError> {
    let update: Arc<dyn PushHandler> = {
        let board = board.clone();
        Arc::new(move |message: InboundMessage| {
            let domain = message.domain();
            let payload = match message {
                InboundMessage::KanbanUpdate(v)
                | InboundMessage::LightsUpdate(v)
                | InboundMessage::MediaUpdate(v) => v,
                InboundMessage::Notification(_) => return,
            };
            match render(domain, &payload) {
                Ok(view) => {
                    board.apply(view);
                }
                Err(e) => debug!(
                    event = "core.dashboard.push_render_failed",
                    domain = %domain,
                    error = %e,
                ),
            }
        })
    };

    let notification: Arc<dyn PushHandler> = Arc::new(move |message: InboundMessage| {
        if let InboundMessage::Notification(n) = message {
            let view = {
                let mut center = center.lock().unwrap_or_else(|e| e.into_inner());
                center.receive(n);
                center.view()
            };
            board.apply(view);
        }
    });

    Ok(Dispatcher::builder()
        .on(MessageKind::KanbanUpdate, update.clone())
        .on(MessageKind::LightsUpdate, update.clone())
        .on(MessageKind::MediaUpdate, update)
        .on(MessageKind::Notification, notification)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MessageSink;
    use homeboard_protocol::{Frame, Notification, NotificationKind};
    use serde_json::json;

    fn dispatcher() -> (Dispatcher, Arc<WidgetBoard>, Arc<Mutex<NotificationCenter>>) {
        let board = Arc::new(WidgetBoard::new());
        let center = Arc::new(Mutex::new(NotificationCenter::new()));
        let d = push_dispatcher(board.clone(), center.clone()).unwrap();
        (d, board, center)
    }

    #[test]
    fn test_push_update_renders_domain_widget() {
        let (d, board, _) = dispatcher();
        d.deliver(Frame::Message(InboundMessage::KanbanUpdate(json!({
            "todo": [{"title": "fix gate"}],
            "doing": [],
            "done": []
        }))));
        let view = board.view("kanban").unwrap();
        assert!(view.lines.iter().any(|l| l.contains("fix gate")));
    }

    #[test]
    fn test_push_notification_goes_through_center() {
        let (d, board, center) = dispatcher();
        d.deliver(Frame::Message(InboundMessage::Notification(Notification {
            id: "1".to_string(),
            kind: NotificationKind::Warning,
            title: "Door".to_string(),
            message: "Front door opened".to_string(),
            timestamp: String::new(),
            read: false,
        })));
        assert_eq!(center.lock().unwrap().unread_count(), 1);
        let view = board.view("notifications").unwrap();
        assert_eq!(view.badge.as_deref(), Some("1"));
    }

    #[test]
    fn test_push_with_wrong_shape_leaves_widget_alone() {
        let (d, board, _) = dispatcher();
        d.deliver(Frame::Message(InboundMessage::LightsUpdate(json!([1, 2, 3]))));
        assert!(board.view("lights").is_none());
    }

    #[test]
    fn test_null_notification_payload_is_empty_list() {
        assert!(notification_list(&Value::Null).unwrap().notifications.is_empty());
        assert!(notification_list(&json!("nope")).is_err());
    }
}
