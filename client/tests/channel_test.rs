//! Integration tests for the realtime channel: subscription replay,
//! reconnects, ordering, and malformed-message handling.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tokio_util::sync::CancellationToken;

use tracker_client::channel::EventChannel;
use tracker_client::page::Page;
use tracker_common::config::Config;
use tracker_common::protocol::VehicleId;

const JOIN_42: &str = r#"{"event":"join","data":{"vehicle_id":"42"}}"#;

/// Server behaviour for one test.
#[derive(Clone)]
struct Script {
    /// (connection index, text frame) for every frame the client sends.
    received: mpsc::UnboundedSender<(usize, String)>,
    connections: Arc<AtomicUsize>,
    /// Frames pushed after each client frame.
    replies: Arc<Vec<String>>,
    /// Hang up on the first connection right after its first frame.
    drop_first: bool,
}

async fn ws_handler(ws: WebSocketUpgrade, State(script): State<Script>) -> Response {
    ws.on_upgrade(move |socket| serve(socket, script))
}

async fn serve(mut socket: WebSocket, script: Script) {
    let n = script.connections.fetch_add(1, Ordering::SeqCst);
    while let Some(Ok(msg)) = socket.recv().await {
        if let Message::Text(text) = msg {
            script.received.send((n, text.as_str().to_string())).ok();
            if n == 0 && script.drop_first {
                return;
            }
            for frame in script.replies.iter() {
                if socket.send(Message::Text(frame.clone().into())).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Start the scripted server on a random port; returns its ws URL and the
/// stream of frames it receives.
async fn start_server(
    replies: Vec<String>,
    drop_first: bool,
) -> (String, mpsc::UnboundedReceiver<(usize, String)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let script = Script {
        received: tx,
        connections: Arc::new(AtomicUsize::new(0)),
        replies: Arc::new(replies),
        drop_first,
    };
    let app = Router::new()
        .route("/ws/tracker/", get(ws_handler))
        .with_state(script);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("ws://{addr}/ws/tracker/"), rx)
}

fn config(url: String) -> Config {
    Config {
        ws_url: url,
        vehicle_id: VehicleId::parse("42"),
        dashboard_vehicles: vec![VehicleId::from(42)],
        reconnect_delay_ms: 50,
        ..Config::default()
    }
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn next_frame(rx: &mut mpsc::UnboundedReceiver<(usize, String)>) -> (usize, String) {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no frame in time")
        .expect("server gone")
}

#[tokio::test]
async fn test_events_apply_in_order_to_both_views() {
    let replies = vec![
        json!({"event": "location_update", "data": {
            "vehicle_id": 42, "lat": -34.5, "lng": -58.4, "speed": 12.5,
            "signal_quality": 14, "vehicle_on": true, "shutdown": false,
            "transmit_audio": false, "last_updated": "05-03-2025 08:15"
        }})
        .to_string(),
        "definitely not json".to_string(),
        json!({"event": "audio_command", "data": {"command": "transmit_audio"}}).to_string(),
        json!({"vehicle_id": "42", "command": "shutdown", "shutdown": true}).to_string(),
    ];
    let (url, mut received) = start_server(replies, false).await;

    LocalSet::new()
        .run_until(async move {
            let config = config(url);
            let page = Rc::new(Page::new(&config));
            page.join(VehicleId::from(42));

            let (_out_tx, out_rx) = mpsc::unbounded_channel();
            let cancel = CancellationToken::new();
            let channel = EventChannel::new(config.ws_url.clone(), config.reconnect_delay());
            let task = tokio::task::spawn_local(channel.run(page.clone(), out_rx, cancel.clone()));

            assert_eq!(next_frame(&mut received).await, (0, JOIN_42.to_string()));

            let dom = page.dom();
            wait_until(|| dom.borrow().text("control-state") == Some("Apagado")).await;
            {
                let d = dom.borrow();
                assert_eq!(d.text("speed"), Some("12.50 km/h"));
                assert_eq!(d.text("speed-42"), Some("12.50 km/h"));
                assert_eq!(d.text("lat-42"), Some("-34.500000"));
                assert_eq!(d.text("last-updated"), Some("05-03-2025 08:15"));
                assert_eq!(d.class_name("signal-quality").unwrap(), "signal-bars medium");
                assert_eq!(d.text("control-state-42"), Some("Apagado"));
                // The audio command without vehicle_id was dropped.
                assert_eq!(d.text("audio-state"), Some("Desactivada"));
                assert_eq!(d.children("notification-container").len(), 1);
            }

            cancel.cancel();
            task.await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_rejoins_after_server_hangs_up() {
    let (url, mut received) = start_server(Vec::new(), true).await;

    LocalSet::new()
        .run_until(async move {
            let config = config(url);
            let page = Rc::new(Page::new(&config));
            page.join(VehicleId::from(42));

            let (_out_tx, out_rx) = mpsc::unbounded_channel();
            let cancel = CancellationToken::new();
            let channel = EventChannel::new(config.ws_url.clone(), config.reconnect_delay());
            let status = channel.status();
            let task = tokio::task::spawn_local(channel.run(page.clone(), out_rx, cancel.clone()));

            assert_eq!(next_frame(&mut received).await, (0, JOIN_42.to_string()));
            assert_eq!(next_frame(&mut received).await, (1, JOIN_42.to_string()));
            wait_until(|| status.borrow().connections >= 2).await;

            cancel.cancel();
            task.await.unwrap();
            assert!(!status.borrow().connected);
        })
        .await;
}

#[tokio::test]
async fn test_join_sent_while_connected() {
    let (url, mut received) = start_server(Vec::new(), false).await;

    LocalSet::new()
        .run_until(async move {
            let mut config = config(url);
            config.vehicle_id = None;
            let page = Rc::new(Page::new(&config));

            let (out_tx, out_rx) = mpsc::unbounded_channel();
            let cancel = CancellationToken::new();
            let channel = EventChannel::new(config.ws_url.clone(), config.reconnect_delay());
            let status = channel.status();
            let task = tokio::task::spawn_local(channel.run(page.clone(), out_rx, cancel.clone()));

            wait_until(|| status.borrow().connected).await;
            out_tx.send(page.join(VehicleId::from(42))).unwrap();

            assert_eq!(next_frame(&mut received).await, (0, JOIN_42.to_string()));
            assert_eq!(page.current(), Some(VehicleId::from(42)));

            cancel.cancel();
            task.await.unwrap();
        })
        .await;
}

#[tokio::test]
async fn test_unreachable_server_keeps_retrying() {
    LocalSet::new()
        .run_until(async {
            let page = Rc::new(Page::new(&Config::default()));
            let (_out_tx, out_rx) = mpsc::unbounded_channel();
            let cancel = CancellationToken::new();
            let channel = EventChannel::new("ws://127.0.0.1:1/ws/tracker/", Duration::from_millis(20));
            let status = channel.status();
            let task = tokio::task::spawn_local(channel.run(page.clone(), out_rx, cancel.clone()));

            wait_until(|| status.borrow().attempts >= 3).await;
            assert_eq!(status.borrow().connections, 0);
            assert!(!status.borrow().connected);

            // One toast for the outage, not one per retry.
            let dom = page.dom();
            let d = dom.borrow();
            let toasts = d.children("notification-container");
            assert_eq!(toasts.len(), 1);
            assert!(d.has_class(toasts[0], "alert-danger"));
            assert!(d
                .inner_html(toasts[0])
                .unwrap()
                .contains("Error de conexión WebSocket"));
            drop(d);

            cancel.cancel();
            task.await.unwrap();
        })
        .await;
}
