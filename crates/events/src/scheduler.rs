use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use core_types::EventKey;

use crate::error::EventsError;
use crate::registry::EventRegistry;

/// The backend-facing half of reconciliation.
///
/// Implementations announce the full current set of subscribed keys,
/// never a delta. Both transport adapters implement this; tests provide
/// recording fakes.
#[async_trait]
pub trait SubscriptionSink: Send + Sync {
    async fn update_subscription(&self, events: Vec<EventKey>) -> Result<(), EventsError>;
}

struct SchedulerInner {
    registry: EventRegistry,
    sink: Arc<dyn SubscriptionSink>,
    /// Guards against more than one pending reconciliation task.
    scheduled: AtomicBool,
    /// The key set most recently announced to the backend. May lag the
    /// registry between reconciliations.
    last_synced: Mutex<HashSet<EventKey>>,
}

/// Coalesces registry mutations into at most one backend reconciliation
/// per scheduling turn.
///
/// Mutations commonly arrive in bursts (a page mounting five components,
/// each subscribing to one key). Rather than one round-trip per call,
/// [`SyncScheduler::request_sync`] defers to a spawned task; every
/// further request before that task runs is absorbed. The task then
/// diffs the registry against the last announced set and stays silent
/// when the net membership is unchanged.
#[derive(Clone)]
pub struct SyncScheduler {
    inner: Arc<SchedulerInner>,
}

impl SyncScheduler {
    pub fn new(registry: EventRegistry, sink: Arc<dyn SubscriptionSink>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                registry,
                sink,
                scheduled: AtomicBool::new(false),
                last_synced: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Queues a reconciliation unless one is already pending.
    ///
    /// Never blocks and never surfaces an error to the caller: sink
    /// failures are logged by the reconciliation task. Outside a tokio
    /// runtime the request is dropped with a warning; the next mutation
    /// made inside the runtime recovers the sync.
    pub fn request_sync(&self) {
        if self.inner.scheduled.swap(true, Ordering::AcqRel) {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.inner.scheduled.store(false, Ordering::Release);
            tracing::warn!("subscription sync requested outside an async runtime; dropping");
            return;
        };
        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            inner.reconcile().await;
        });
    }

    /// Forgets the last announced set and queues a reconciliation, so
    /// the full current set is re-announced even though the registry
    /// did not change. The client facade calls this on every reconnect.
    pub fn force_sync(&self) {
        self.inner
            .last_synced
            .lock()
            .expect("last synced set poisoned")
            .clear();
        self.request_sync();
    }

    /// The key set most recently handed to the sink. Exposed for
    /// inspection; only the scheduler mutates it.
    pub fn last_synced(&self) -> HashSet<EventKey> {
        self.inner
            .last_synced
            .lock()
            .expect("last synced set poisoned")
            .clone()
    }
}

impl SchedulerInner {
    async fn reconcile(&self) {
        // Clear the flag before reading the registry: a mutation racing
        // in after the read must be able to queue a fresh task.
        self.scheduled.store(false, Ordering::Release);

        let current = self.registry.subscribed_events();
        {
            let mut last = self.last_synced.lock().expect("last synced set poisoned");
            if *last == current {
                return;
            }
            // Optimistic: the attempted set is recorded before the push.
            // On failure the backend lags until the next mutation, which
            // re-diffs against the then-current registry.
            *last = current.clone();
        }

        let events: Vec<EventKey> = current.into_iter().collect();
        tracing::debug!(count = events.len(), "announcing subscription set");
        if let Err(e) = self.sink.update_subscription(events).await {
            tracing::warn!(error = %e, "failed to push the subscription set to the backend");
        }
    }
}
