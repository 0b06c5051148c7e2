//! Push and poll feeding the same widget, on virtual time.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use homeboard_core::channel::FrameStream;
use homeboard_core::{
    BoardEvent, ChannelError, Dashboard, DashboardApi, DashboardParts, Domain, FetchError,
    HomeboardConfig, ManualClock, SystemStatus, Transport, WidgetBoard, render,
};
use homeboard_protocol::{Action, InboundMessage};
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};

/// Serves whatever payload each domain was last given; records fetches.
#[derive(Default)]
struct FakeApi {
    payloads: Mutex<BTreeMap<Domain, Value>>,
    fetches: Mutex<Vec<Domain>>,
}

impl FakeApi {
    fn set(&self, domain: Domain, payload: Value) {
        self.payloads.lock().unwrap().insert(domain, payload);
    }

    fn fetch_count(&self, domain: Domain) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|d| **d == domain)
            .count()
    }
}

impl DashboardApi for FakeApi {
    fn fetch(&self, domain: Domain) -> BoxFuture<'static, Result<Value, FetchError>> {
        self.fetches.lock().unwrap().push(domain);
        let payload = self
            .payloads
            .lock()
            .unwrap()
            .get(&domain)
            .cloned()
            .unwrap_or(Value::Null);
        async move { Ok(payload) }.boxed()
    }

    fn post(&self, _action: &Action) -> BoxFuture<'static, Result<Value, FetchError>> {
        async { Ok(json!({"success": true})) }.boxed()
    }
}

/// Hands out a stream fed by the test through an mpsc sender.
struct PipeTransport {
    rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl Transport for PipeTransport {
    fn connect(&self, _url: &str) -> BoxFuture<'static, Result<FrameStream, ChannelError>> {
        let rx = self.rx.lock().unwrap().take();
        async move {
            let Some(rx) = rx else {
                return futures::future::pending().await;
            };
            let frames = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|text| (Ok(text), rx))
            });
            Ok(Box::pin(frames) as FrameStream)
        }
        .boxed()
    }
}

fn lights(desk_on: bool) -> Value {
    json!({
        "Office": {
            "lights": [
                {"name": "Desk", "state": if desk_on { "on" } else { "off" }, "brightness": 255},
                {"name": "Lamp", "state": "off"}
            ],
            "any_on": desk_on
        }
    })
}

fn lights_changes(rx: &mut broadcast::Receiver<BoardEvent>) -> usize {
    let mut n = 0;
    while let Ok(event) = rx.try_recv() {
        if let BoardEvent::WidgetChanged(view) = event
            && view.widget == "lights"
        {
            n += 1;
        }
    }
    n
}

fn build(
    dir: &tempfile::TempDir,
) -> (Dashboard, Arc<FakeApi>, mpsc::UnboundedSender<String>) {
    let mut config = HomeboardConfig::default();
    config.ui.state_file = Some(dir.path().join("ui_state.json"));
    config.poll.overrides.insert("lights".to_string(), 10);

    let api = Arc::new(FakeApi::default());
    let (tx, rx) = mpsc::unbounded_channel();
    let parts = DashboardParts {
        api: api.clone(),
        transport: Arc::new(PipeTransport {
            rx: Mutex::new(Some(rx)),
        }),
        push_url: "ws://hub.test/ws".to_string(),
        clock: Arc::new(ManualClock::new(chrono::Utc::now())),
        alarm: Arc::new(|_: &homeboard_core::Timer| {}),
    };
    let dashboard = Dashboard::with_parts(&config, parts).unwrap();
    (dashboard, api, tx)
}

fn lights_view(board: &WidgetBoard) -> Option<Vec<String>> {
    board.view("lights").map(|v| v.lines)
}

#[tokio::test(start_paused = true)]
async fn test_push_shows_immediately_and_next_poll_does_not_flicker() {
    let dir = tempfile::TempDir::new().unwrap();
    let (dashboard, api, push) = build(&dir);
    api.set(Domain::Lights, lights(false));

    let mut events = dashboard.board().subscribe();
    dashboard.start().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let off = render(Domain::Lights, &lights(false)).unwrap();
    assert_eq!(lights_view(dashboard.board()), Some(off.lines));
    assert_eq!(dashboard.board().status(), SystemStatus::Online);
    assert_eq!(api.fetch_count(Domain::Lights), 1);
    assert_eq!(lights_changes(&mut events), 1);

    // Eight seconds in, the desk lamp turns on and the server pushes it.
    tokio::time::sleep(Duration::from_secs(8)).await;
    api.set(Domain::Lights, lights(true));
    let frame = InboundMessage::LightsUpdate(lights(true))
        .to_frame_text()
        .unwrap();
    push.send(frame).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let on = render(Domain::Lights, &lights(true)).unwrap();
    assert_eq!(lights_view(dashboard.board()), Some(on.lines.clone()));
    assert_eq!(api.fetch_count(Domain::Lights), 1);
    assert_eq!(lights_changes(&mut events), 1);

    // The poll that was due two seconds later re-renders the same data.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(api.fetch_count(Domain::Lights), 2);
    assert_eq!(lights_view(dashboard.board()), Some(on.lines));
    assert_eq!(lights_changes(&mut events), 0);

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_bad_frames_do_not_disturb_channel_or_widgets() {
    let dir = tempfile::TempDir::new().unwrap();
    let (dashboard, _api, push) = build(&dir);
    dashboard.start().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    push.send("{not json".to_string()).unwrap();
    push.send(r#"{"type":"time","timestamp":"2024-06-10T08:00:00"}"#.to_string())
        .unwrap();
    push.send(r#"{"type":"lights_update","data":[1,2]}"#.to_string())
        .unwrap();
    push.send(
        InboundMessage::MediaUpdate(json!([
            {"entity_id": "media_player.tv", "name": "TV", "state": "playing", "media_title": "Bluey"}
        ]))
        .to_frame_text()
        .unwrap(),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(dashboard.board().status(), SystemStatus::Online);
    let media = dashboard.board().view("media").unwrap();
    assert!(media.lines.iter().any(|l| l.contains("Bluey")));
    assert!(dashboard.board().view("lights").unwrap().is_placeholder());

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_update_without_data_keeps_live_widget() {
    let dir = tempfile::TempDir::new().unwrap();
    let (dashboard, api, push) = build(&dir);
    api.set(Domain::Lights, lights(true));
    dashboard.start().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let on = render(Domain::Lights, &lights(true)).unwrap();
    assert_eq!(lights_view(dashboard.board()), Some(on.lines.clone()));

    push.send(r#"{"type":"lights_update"}"#.to_string()).unwrap();
    push.send(r#"{"type":"lights_update","data":null}"#.to_string())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(lights_view(dashboard.board()), Some(on.lines));
    assert_eq!(dashboard.board().status(), SystemStatus::Online);

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_pushed_notification_then_mark_read() {
    let dir = tempfile::TempDir::new().unwrap();
    let (dashboard, api, push) = build(&dir);
    dashboard.start().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    push.send(
        r#"{"type":"notification","data":{"id":"9","title":"Washer","message":"Cycle done","type":"success"}}"#
            .to_string(),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(dashboard.unread_notifications(), 1);

    // The server now reports it read, so the reconcile poll agrees.
    api.set(
        Domain::Notifications,
        json!({"notifications": [
            {"id": "9", "title": "Washer", "message": "Cycle done", "type": "success", "read": true}
        ]}),
    );
    let outcome = dashboard
        .actions()
        .perform(Action::MarkNotificationRead {
            id: "9".to_string(),
        })
        .await;
    assert_eq!(outcome, homeboard_core::ActionOutcome::Sent);
    assert_eq!(dashboard.unread_notifications(), 0);
    assert_eq!(
        dashboard.board().view("notifications").unwrap().badge,
        None
    );

    dashboard.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_startup_uses_stored_collapse_state() {
    let dir = tempfile::TempDir::new().unwrap();
    let (dashboard, _api, _push) = build(&dir);
    dashboard
        .state_store()
        .save(&BTreeMap::from([
            ("lights".to_string(), false),
            ("cameras".to_string(), true),
        ]))
        .unwrap();

    let collapse = dashboard.start().unwrap();
    assert!(!collapse["lights"]);
    assert!(!collapse["cameras"]);
    assert!(collapse["weather"]);
    dashboard.shutdown();
}
