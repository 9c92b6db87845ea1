use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use core_types::EventKey;
use events::error::EventsError;
use events::lifecycle::ConnectionLifecycle;
use events::messages::{SubscriptionUpdate, decode_frame};
use events::registry::EventRegistry;
use events::scheduler::SubscriptionSink;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::Client;
use url::Url;

use crate::Transport;
use crate::error::TransportError;

/// Persistent server-to-client stream adapter.
///
/// Inbound events arrive on a long-lived SSE response from
/// `GET /api/events/stream`; the subscription set travels out of band
/// as `POST /api/update-subscription`. The stream carries no
/// client-to-server traffic at all.
pub struct StreamTransport {
    http: Client,
    stream_url: Url,
    update_url: Url,
    registry: EventRegistry,
    lifecycle: ConnectionLifecycle,
    reconnect_delay: Duration,
    started: AtomicBool,
}

impl StreamTransport {
    pub fn new(
        base_url: &str,
        registry: EventRegistry,
        lifecycle: ConnectionLifecycle,
        reconnect_delay: Duration,
    ) -> Result<Self, TransportError> {
        let base = Url::parse(base_url)?;
        Ok(Self {
            http: Client::new(),
            stream_url: base.join("/api/events/stream")?,
            update_url: base.join("/api/update-subscription")?,
            registry,
            lifecycle,
            reconnect_delay,
            started: AtomicBool::new(false),
        })
    }

    async fn run(self: Arc<Self>) {
        loop {
            let request = self
                .http
                .get(self.stream_url.clone())
                .header("accept", "text/event-stream");
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => {
                    tracing::info!(url = %self.stream_url, "event stream established");
                    self.lifecycle.set_connected(true);
                    let mut stream = response.bytes_stream().eventsource();
                    while let Some(event) = stream.next().await {
                        match event {
                            Ok(event) => self.dispatch(&event.data),
                            Err(e) => {
                                tracing::warn!(error = %e, "event stream read error");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to open the event stream");
                }
            }
            self.lifecycle.set_connected(false);
            tracing::warn!(
                delay_secs = self.reconnect_delay.as_secs_f32(),
                "event stream disconnected, reconnecting"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Decodes one frame and fans it out. Undecodable frames are
    /// dropped here and never reach a listener.
    fn dispatch(&self, raw: &str) {
        match decode_frame(raw) {
            Ok((event, payload)) => self.registry.notify(&event, &payload),
            Err(e) => tracing::warn!(error = %e, "dropping undecodable frame"),
        }
    }
}

impl Transport for StreamTransport {
    fn connect(self: Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::warn!("stream transport is already connected");
            return;
        }
        tokio::spawn(self.run());
    }
}

#[async_trait]
impl SubscriptionSink for StreamTransport {
    async fn update_subscription(&self, events: Vec<EventKey>) -> Result<(), EventsError> {
        if !self.lifecycle.is_connected() {
            tracing::debug!("event stream is down; skipping subscription update");
            return Ok(());
        }
        let body = SubscriptionUpdate { events };
        let response = self
            .http
            .post(self.update_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| EventsError::Sync(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EventsError::Sync(format!(
                "update-subscription returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
