use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use core_types::EventKey;
use serde_json::Value;

/// A callback bound to exactly one event key.
///
/// Listener identity is `Arc` pointer identity: registering the same
/// `Arc` twice under one key collapses to a single entry, and
/// unsubscribing removes by the same identity. Content is never
/// compared.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

struct RegistryInner {
    /// Invariant: a key whose listener vector empties is removed from
    /// the map, so the key set of this map is exactly the set of
    /// currently subscribed events.
    listeners: Mutex<HashMap<EventKey, Vec<Listener>>>,
    on_change: OnceLock<Box<dyn Fn() + Send + Sync>>,
}

/// Per-key listener bookkeeping. Pure in-memory state, no I/O.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct EventRegistry {
    inner: Arc<RegistryInner>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                listeners: Mutex::new(HashMap::new()),
                on_change: OnceLock::new(),
            }),
        }
    }

    /// Installs the hook fired after every membership mutation. The
    /// client facade wires this to the sync scheduler. A second call is
    /// ignored.
    pub fn set_change_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        if self.inner.on_change.set(Box::new(hook)).is_err() {
            tracing::warn!("registry change hook is already installed; ignoring");
        }
    }

    /// Registers `listener` under `event` and returns the guard that
    /// removes it again.
    ///
    /// Always succeeds: keys are not validated against any allowlist,
    /// and subscribing to a key the backend never produces simply never
    /// fires. Registering an `Arc` that is already present under the
    /// key leaves the registry unchanged.
    pub fn subscribe(&self, event: impl Into<EventKey>, listener: Listener) -> Subscription {
        let event = event.into();
        {
            let mut listeners = self.inner.listeners.lock().expect("listener map poisoned");
            let entries = listeners.entry(event.clone()).or_default();
            if !entries.iter().any(|l| Arc::ptr_eq(l, &listener)) {
                entries.push(Arc::clone(&listener));
            }
        }
        self.notify_changed();
        Subscription {
            registry: self.clone(),
            event,
            listener,
            active: AtomicBool::new(true),
        }
    }

    /// Removes `listener` from `event` by identity.
    ///
    /// Removing a listener that was never registered is a silent no-op.
    /// The change hook fires regardless, because callers cannot know
    /// whether the membership actually changed.
    pub fn unsubscribe(&self, event: &str, listener: &Listener) {
        {
            let mut listeners = self.inner.listeners.lock().expect("listener map poisoned");
            if let Some(entries) = listeners.get_mut(event) {
                entries.retain(|l| !Arc::ptr_eq(l, listener));
                if entries.is_empty() {
                    listeners.remove(event);
                }
            }
        }
        self.notify_changed();
    }

    /// Invokes every listener currently registered under `event` with
    /// `payload`, synchronously and in insertion order.
    ///
    /// The listener set is snapshotted before the first invocation, so
    /// listeners added during the pass do not see the triggering event
    /// and removals during the pass do not suppress delivery.
    pub fn notify(&self, event: &str, payload: &Value) {
        let snapshot = {
            let listeners = self.inner.listeners.lock().expect("listener map poisoned");
            listeners.get(event).cloned()
        };
        if let Some(entries) = snapshot {
            for listener in &entries {
                listener(payload);
            }
        }
    }

    /// The set of event keys with at least one live listener.
    pub fn subscribed_events(&self) -> HashSet<EventKey> {
        let listeners = self.inner.listeners.lock().expect("listener map poisoned");
        listeners.keys().cloned().collect()
    }

    fn notify_changed(&self) {
        if let Some(hook) = self.inner.on_change.get() {
            hook();
        }
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`EventRegistry::subscribe`].
///
/// Dropping the guard unsubscribes the listener, which is how consuming
/// components release their interest when they are torn down. Explicit
/// [`Subscription::unsubscribe`] does the same ahead of time and may be
/// called more than once.
#[must_use = "dropping a Subscription immediately unsubscribes its listener"]
pub struct Subscription {
    registry: EventRegistry,
    event: EventKey,
    listener: Listener,
    active: AtomicBool,
}

impl Subscription {
    /// Removes the listener from the registry. Calling this more than
    /// once is a no-op.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.registry.unsubscribe(&self.event, &self.listener);
        }
    }

    /// The event key this subscription is bound to.
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
