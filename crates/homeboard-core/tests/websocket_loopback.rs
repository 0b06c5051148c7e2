//! The real WebSocket transport against a loopback server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use homeboard_core::channel::WsTransport;
use homeboard_core::{ConnectionState, Dispatcher, EventChannel, MessageSink, RetryPolicy};
use homeboard_protocol::{Frame, InboundMessage, MessageKind};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

#[derive(Default)]
struct Recorder(Mutex<Vec<Frame>>);

impl MessageSink for Recorder {
    fn deliver(&self, frame: Frame) {
        self.0.lock().unwrap().push(frame);
    }
}

async fn wait_for(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_frames_arrive_and_close_triggers_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let lights = InboundMessage::LightsUpdate(json!({"Office": {"lights": [], "any_on": false}}));
    let frame = lights.to_frame_text().unwrap();

    let accepted = Arc::new(Mutex::new(0usize));
    let server_accepted = accepted.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            *server_accepted.lock().unwrap() += 1;
            ws.send(Message::text(r#"{"type":"time","timestamp":"now"}"#.to_string()))
                .await
                .unwrap();
            ws.send(Message::text("garbage".to_string())).await.unwrap();
            ws.send(Message::binary(frame.clone().into_bytes()))
                .await
                .unwrap();
            ws.close(None).await.ok();
            // Drain until the client hangs up.
            while ws.next().await.is_some() {}
        }
    });

    let recorder = Arc::new(Recorder::default());
    let channel = EventChannel::new(
        format!("ws://{addr}/ws"),
        Arc::new(WsTransport),
        RetryPolicy::new(Duration::from_millis(50), Duration::from_millis(200)),
    );
    channel.on_message(recorder.clone());
    channel.connect();

    wait_for(|| *accepted.lock().unwrap() >= 2).await;
    channel.shutdown();
    assert_eq!(channel.state(), ConnectionState::Closed);

    let frames = recorder.0.lock().unwrap().clone();
    assert!(frames.contains(&Frame::Message(lights.clone())));
    assert!(frames.contains(&Frame::Unrecognized {
        tag: "time".to_string()
    }));
}

#[tokio::test]
async fn test_unreachable_server_keeps_retrying() {
    // Bind then drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();

    let channel = EventChannel::new(
        format!("ws://{addr}/ws"),
        Arc::new(WsTransport),
        RetryPolicy::new(Duration::from_millis(20), Duration::from_millis(40)),
    );
    let noop: Arc<dyn homeboard_core::PushHandler> = Arc::new(|_msg: InboundMessage| {});
    let mut builder = Dispatcher::builder();
    for kind in MessageKind::ALL {
        builder = builder.on(kind, noop.clone());
    }
    channel.on_message(Arc::new(builder.build().unwrap()));

    let mut status = channel.status();
    channel.connect();
    let mut transitions = 0;
    tokio::time::timeout(Duration::from_secs(5), async {
        while transitions < 6 {
            status.changed().await.unwrap();
            assert_ne!(*status.borrow_and_update(), ConnectionState::Open);
            transitions += 1;
        }
    })
    .await
    .unwrap();

    channel.shutdown();
    assert_eq!(channel.state(), ConnectionState::Closed);
}
