use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use core_types::EventKey;
use events::error::EventsError;
use events::lifecycle::ConnectionLifecycle;
use events::messages::{SubscriptionUpdate, decode_frame};
use events::registry::EventRegistry;
use events::scheduler::SubscriptionSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::Transport;
use crate::error::TransportError;

/// Bidirectional socket adapter.
///
/// One session to the backend origin carries both directions: inbound
/// frames are decoded through the shared envelope and fanned out, and
/// the subscription set is announced in-band as a `"subscribe"` control
/// frame rather than a separate HTTP call.
pub struct SocketTransport {
    socket_url: Url,
    registry: EventRegistry,
    lifecycle: ConnectionLifecycle,
    control_tx: mpsc::Sender<SubscriptionUpdate>,
    /// Taken exactly once by the connection task.
    control_rx: Mutex<Option<mpsc::Receiver<SubscriptionUpdate>>>,
    reconnect_delay: Duration,
}

impl SocketTransport {
    pub fn new(
        base_url: &str,
        registry: EventRegistry,
        lifecycle: ConnectionLifecycle,
        reconnect_delay: Duration,
    ) -> Result<Self, TransportError> {
        let (control_tx, control_rx) = mpsc::channel(16);
        Ok(Self {
            socket_url: socket_endpoint(base_url)?,
            registry,
            lifecycle,
            control_tx,
            control_rx: Mutex::new(Some(control_rx)),
            reconnect_delay,
        })
    }

    async fn run(self: Arc<Self>, mut control_rx: mpsc::Receiver<SubscriptionUpdate>) {
        loop {
            match connect_async(self.socket_url.as_str()).await {
                Ok((session, _)) => {
                    tracing::info!(url = %self.socket_url, "socket session established");
                    let (mut ws_tx, mut ws_rx) = session.split();
                    self.lifecycle.set_connected(true);
                    loop {
                        tokio::select! {
                            update = control_rx.recv() => {
                                let Some(update) = update else { return };
                                match update.to_control_frame() {
                                    Ok(text) => {
                                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => tracing::warn!(
                                        error = %e,
                                        "failed to encode the subscription control frame"
                                    ),
                                }
                            }
                            frame = ws_rx.next() => {
                                match frame {
                                    Some(Ok(Message::Text(text))) => self.dispatch(text.as_str()),
                                    Some(Ok(Message::Close(frame))) => {
                                        tracing::info!(?frame, "socket session closed by the backend");
                                        break;
                                    }
                                    Some(Ok(_)) => {} // ping/pong/binary carry no events
                                    Some(Err(e)) => {
                                        tracing::warn!(error = %e, "socket read error");
                                        break;
                                    }
                                    None => break,
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to open the socket session");
                }
            }
            self.lifecycle.set_connected(false);
            tracing::warn!(
                delay_secs = self.reconnect_delay.as_secs_f32(),
                "socket disconnected, reconnecting"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    fn dispatch(&self, raw: &str) {
        match decode_frame(raw) {
            Ok((event, payload)) => self.registry.notify(&event, &payload),
            Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
        }
    }
}

impl Transport for SocketTransport {
    fn connect(self: Arc<Self>) {
        let taken = self
            .control_rx
            .lock()
            .expect("control receiver poisoned")
            .take();
        let Some(control_rx) = taken else {
            tracing::warn!("socket transport is already connected");
            return;
        };
        tokio::spawn(self.run(control_rx));
    }
}

#[async_trait]
impl SubscriptionSink for SocketTransport {
    async fn update_subscription(&self, events: Vec<EventKey>) -> Result<(), EventsError> {
        if !self.lifecycle.is_connected() {
            tracing::debug!("socket session is down; skipping subscription update");
            return Ok(());
        }
        self.control_tx
            .send(SubscriptionUpdate { events })
            .await
            .map_err(|e| EventsError::Sync(e.to_string()))
    }
}

/// Derives the socket endpoint from the backend origin: the scheme
/// moves to its socket counterpart and the path is fixed at `/ws`.
fn socket_endpoint(base_url: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(TransportError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|()| TransportError::UnsupportedScheme(scheme.to_string()))?;
    url.set_path("/ws");
    url.set_query(None);
    Ok(url)
}
