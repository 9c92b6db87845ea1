//! # Pulse Realtime Client
//!
//! The public face of the realtime layer. A [`RealtimeClient`] owns the
//! listener registry, the connection lifecycle, the sync scheduler, and
//! the configured wire transport, wired together so that:
//!
//! - every registry mutation requests a coalesced backend reconciliation,
//! - every reconnect re-announces the current subscription set, and
//! - application code only ever sees `subscribe`, `unsubscribe`, and the
//!   lifecycle hooks.

use std::sync::Arc;

use configuration::{RealtimeConfig, TransportKind};
use core_types::EventKey;
use events::lifecycle::{ConnectionLifecycle, LifecycleObserver, ObserverGuard};
use events::registry::{EventRegistry, Listener, Subscription};
use events::scheduler::{SubscriptionSink, SyncScheduler};
use transport::{SocketTransport, StreamTransport, Transport};

// Declare the modules that make up this crate.
pub mod error;

// Re-export the core types to provide a clean public API.
pub use error::ClientError;

/// Client handle for the dashboard's realtime event feed.
///
/// Construct one per backend and call [`connect`] once. Subscriptions
/// made before the connection is up are announced as soon as it is.
///
/// [`connect`]: RealtimeClient::connect
pub struct RealtimeClient {
    registry: EventRegistry,
    lifecycle: ConnectionLifecycle,
    transport: Arc<dyn Transport>,
    // Held so the reconnect replay observer lives as long as the client.
    _replay: ObserverGuard,
}

impl RealtimeClient {
    /// Builds the full stack for the configured transport. No I/O
    /// happens until [`RealtimeClient::connect`].
    pub fn new(config: &RealtimeConfig) -> Result<Self, ClientError> {
        let registry = EventRegistry::new();
        let lifecycle = ConnectionLifecycle::new();

        let (transport, sink): (Arc<dyn Transport>, Arc<dyn SubscriptionSink>) =
            match config.transport {
                TransportKind::Stream => {
                    let t = Arc::new(StreamTransport::new(
                        &config.base_url,
                        registry.clone(),
                        lifecycle.clone(),
                        config.reconnect_delay(),
                    )?);
                    (t.clone(), t)
                }
                TransportKind::Socket => {
                    let t = Arc::new(SocketTransport::new(
                        &config.base_url,
                        registry.clone(),
                        lifecycle.clone(),
                        config.reconnect_delay(),
                    )?);
                    (t.clone(), t)
                }
            };

        let scheduler = SyncScheduler::new(registry.clone(), sink);

        // Registry mutations drive reconciliation...
        let hook = scheduler.clone();
        registry.set_change_hook(move || hook.request_sync());

        // ...and a fresh connection re-announces the current set, so
        // interest registered while offline is never lost.
        let replay = scheduler.clone();
        let replay_guard = lifecycle.on_connect(Arc::new(move || replay.force_sync()));

        Ok(Self {
            registry,
            lifecycle,
            transport,
            _replay: replay_guard,
        })
    }

    /// Spawns the transport's connection task and returns immediately.
    /// Use [`RealtimeClient::on_connect`] to observe liveness.
    pub fn connect(&self) {
        Arc::clone(&self.transport).connect();
    }

    /// Registers `listener` for `event`. See
    /// [`EventRegistry::subscribe`] for the identity and idempotence
    /// rules; the returned guard unsubscribes on drop.
    pub fn subscribe(&self, event: impl Into<EventKey>, listener: Listener) -> Subscription {
        self.registry.subscribe(event, listener)
    }

    /// Removes `listener` from `event` by identity; a silent no-op for
    /// a listener that was never registered.
    pub fn unsubscribe(&self, event: &str, listener: &Listener) {
        self.registry.unsubscribe(event, listener);
    }

    /// Fires `observer` on every disconnected-to-connected transition.
    pub fn on_connect(&self, observer: LifecycleObserver) -> ObserverGuard {
        self.lifecycle.on_connect(observer)
    }

    /// Fires `observer` on every connected-to-disconnected transition.
    pub fn on_disconnect(&self, observer: LifecycleObserver) -> ObserverGuard {
        self.lifecycle.on_disconnect(observer)
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle.is_connected()
    }
}
