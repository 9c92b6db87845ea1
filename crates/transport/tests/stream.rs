//! Round-trip tests for the stream adapter against an in-process
//! backend fake: SSE for the inbound leg, a captured POST for the
//! reconciliation leg.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use events::lifecycle::ConnectionLifecycle;
use events::messages::SubscriptionUpdate;
use events::registry::{EventRegistry, Listener};
use events::scheduler::{SubscriptionSink, SyncScheduler};
use futures_util::Stream;
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::{Value, json};
use tokio::sync::{Notify, mpsc};
use transport::{StreamTransport, Transport};

#[derive(Clone)]
struct ServerState {
    posted_tx: mpsc::UnboundedSender<SubscriptionUpdate>,
    gate: Arc<Notify>,
}

/// Holds the stream open; releases one garbage frame and one real event
/// once the subscription update has arrived.
async fn stream_handler(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let gate = state.gate.clone();
    let events = stream::once(async move {
        gate.notified().await;
        Ok::<Event, Infallible>(Event::default().data("not-json"))
    })
    .chain(stream::once(async {
        Ok(Event::default().data(r#"{"event":"ping","payload":{"n":1}}"#))
    }))
    .chain(stream::pending());
    Sse::new(events)
}

async fn update_handler(
    State(state): State<ServerState>,
    Json(update): Json<SubscriptionUpdate>,
) -> StatusCode {
    let _ = state.posted_tx.send(update);
    state.gate.notify_one();
    StatusCode::OK
}

async fn spawn_backend() -> (String, mpsc::UnboundedReceiver<SubscriptionUpdate>) {
    let (posted_tx, posted_rx) = mpsc::unbounded_channel();
    let state = ServerState {
        posted_tx,
        gate: Arc::new(Notify::new()),
    };
    let app = Router::new()
        .route("/api/events/stream", get(stream_handler))
        .route("/api/update-subscription", post(update_handler))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), posted_rx)
}

async fn wait_until_connected(lifecycle: &ConnectionLifecycle) {
    for _ in 0..500 {
        if lifecycle.is_connected() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("transport never reported a connection");
}

#[tokio::test]
async fn full_round_trip_over_the_stream_transport() {
    let (base_url, mut posted_rx) = spawn_backend().await;

    let registry = EventRegistry::new();
    let lifecycle = ConnectionLifecycle::new();
    let transport = Arc::new(
        StreamTransport::new(
            &base_url,
            registry.clone(),
            lifecycle.clone(),
            Duration::from_millis(100),
        )
        .unwrap(),
    );
    let scheduler = SyncScheduler::new(registry.clone(), transport.clone());
    let hook = scheduler.clone();
    registry.set_change_hook(move || hook.request_sync());

    Arc::clone(&transport).connect();
    wait_until_connected(&lifecycle).await;

    let (payload_tx, mut payload_rx) = mpsc::unbounded_channel::<Value>();
    let listener: Listener = Arc::new(move |payload| {
        let _ = payload_tx.send(payload.clone());
    });
    let _sub = registry.subscribe("ping", listener);

    // The mutation coalesces into one POST carrying the full set.
    let posted = tokio::time::timeout(Duration::from_secs(5), posted_rx.recv())
        .await
        .expect("no subscription update reached the backend")
        .unwrap();
    assert_eq!(posted.events, vec!["ping".to_string()]);

    // The garbage frame is dropped; the real event reaches the listener.
    let payload = tokio::time::timeout(Duration::from_secs(5), payload_rx.recv())
        .await
        .expect("no event reached the listener")
        .unwrap();
    assert_eq!(payload, json!({"n": 1}));
    assert!(payload_rx.try_recv().is_err());
}

#[tokio::test]
async fn a_rejected_update_surfaces_as_a_sync_error() {
    async fn reject() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
    let app = Router::new().route("/api/update-subscription", post(reject));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let lifecycle = ConnectionLifecycle::new();
    let transport = StreamTransport::new(
        &format!("http://{addr}"),
        EventRegistry::new(),
        lifecycle.clone(),
        Duration::from_secs(5),
    )
    .unwrap();

    // The adapter only pushes while it believes the stream is up.
    lifecycle.set_connected(true);
    let result = transport
        .update_subscription(vec!["price_update".to_string()])
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn updates_are_skipped_while_disconnected() {
    let lifecycle = ConnectionLifecycle::new();
    // No backend at this address; a send attempt would fail loudly.
    let transport = StreamTransport::new(
        "http://127.0.0.1:9",
        EventRegistry::new(),
        lifecycle.clone(),
        Duration::from_secs(5),
    )
    .unwrap();

    let result = transport
        .update_subscription(vec!["price_update".to_string()])
        .await;
    assert!(result.is_ok());
}
