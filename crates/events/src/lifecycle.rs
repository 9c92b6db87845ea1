use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A no-argument callback fired on a connect or disconnect transition.
///
/// Identity is `Arc` pointer identity, mirroring registry listeners.
pub type LifecycleObserver = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Transition {
    Connect,
    Disconnect,
}

struct LifecycleInner {
    connected: Mutex<bool>,
    on_connect: Mutex<Vec<LifecycleObserver>>,
    on_disconnect: Mutex<Vec<LifecycleObserver>>,
}

/// Tracks the single connected/disconnected bit and fans transitions
/// out to registered observers.
///
/// The manager is transport-agnostic: it records that the state
/// changed, never why. Dependent code should treat "connected" as a
/// precondition for subscriptions having any backend-side effect, since
/// the transports drop reconciliations while disconnected.
#[derive(Clone)]
pub struct ConnectionLifecycle {
    inner: Arc<LifecycleInner>,
}

impl ConnectionLifecycle {
    /// Starts in the disconnected state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LifecycleInner {
                connected: Mutex::new(false),
                on_connect: Mutex::new(Vec::new()),
                on_disconnect: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.lock().expect("connection state poisoned")
    }

    /// Records the new connection state.
    ///
    /// A call that does not change the state is a no-op and fires
    /// nothing. An actual transition fires the matching observer list
    /// exactly once, synchronously, in registration order.
    pub fn set_connected(&self, value: bool) {
        let snapshot = {
            let mut connected = self.inner.connected.lock().expect("connection state poisoned");
            if *connected == value {
                return;
            }
            *connected = value;
            let observers = if value {
                self.inner.on_connect.lock().expect("observer list poisoned")
            } else {
                self.inner.on_disconnect.lock().expect("observer list poisoned")
            };
            observers.clone()
        };
        for observer in &snapshot {
            observer();
        }
    }

    /// Registers an observer fired on every disconnected-to-connected
    /// transition. The returned guard unregisters it.
    pub fn on_connect(&self, observer: LifecycleObserver) -> ObserverGuard {
        self.register(Transition::Connect, observer)
    }

    /// Registers an observer fired on every connected-to-disconnected
    /// transition. The returned guard unregisters it.
    pub fn on_disconnect(&self, observer: LifecycleObserver) -> ObserverGuard {
        self.register(Transition::Disconnect, observer)
    }

    fn register(&self, transition: Transition, observer: LifecycleObserver) -> ObserverGuard {
        {
            let mut observers = self.observers(transition);
            if !observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
                observers.push(Arc::clone(&observer));
            }
        }
        ObserverGuard {
            lifecycle: self.clone(),
            transition,
            observer,
            active: AtomicBool::new(true),
        }
    }

    fn unregister(&self, transition: Transition, observer: &LifecycleObserver) {
        let mut observers = self.observers(transition);
        observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    fn observers(&self, transition: Transition) -> std::sync::MutexGuard<'_, Vec<LifecycleObserver>> {
        match transition {
            Transition::Connect => self.inner.on_connect.lock().expect("observer list poisoned"),
            Transition::Disconnect => {
                self.inner.on_disconnect.lock().expect("observer list poisoned")
            }
        }
    }
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`ConnectionLifecycle::on_connect`] and
/// [`ConnectionLifecycle::on_disconnect`]. Dropping it, or calling
/// [`ObserverGuard::unregister`], removes the observer; either is safe
/// to do more than once.
#[must_use = "dropping an ObserverGuard immediately unregisters its observer"]
pub struct ObserverGuard {
    lifecycle: ConnectionLifecycle,
    transition: Transition,
    observer: LifecycleObserver,
    active: AtomicBool,
}

impl ObserverGuard {
    pub fn unregister(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.lifecycle.unregister(self.transition, &self.observer);
        }
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_observer(counter: Arc<AtomicUsize>) -> LifecycleObserver {
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn starts_disconnected() {
        let lifecycle = ConnectionLifecycle::new();
        assert!(!lifecycle.is_connected());
    }

    #[test]
    fn repeated_set_connected_fires_observers_once() {
        let lifecycle = ConnectionLifecycle::new();
        let connects = Arc::new(AtomicUsize::new(0));
        let _guard = lifecycle.on_connect(counting_observer(connects.clone()));

        lifecycle.set_connected(true);
        lifecycle.set_connected(true);

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(lifecycle.is_connected());
    }

    #[test]
    fn transitions_fire_the_matching_observer_list_only() {
        let lifecycle = ConnectionLifecycle::new();
        let connects = Arc::new(AtomicUsize::new(0));
        let disconnects = Arc::new(AtomicUsize::new(0));
        let _up = lifecycle.on_connect(counting_observer(connects.clone()));
        let _down = lifecycle.on_disconnect(counting_observer(disconnects.clone()));

        lifecycle.set_connected(true);
        lifecycle.set_connected(false);
        lifecycle.set_connected(true);

        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn setting_false_while_disconnected_is_a_noop() {
        let lifecycle = ConnectionLifecycle::new();
        let disconnects = Arc::new(AtomicUsize::new(0));
        let _guard = lifecycle.on_disconnect(counting_observer(disconnects.clone()));

        lifecycle.set_connected(false);

        assert_eq!(disconnects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregistered_observers_stop_firing() {
        let lifecycle = ConnectionLifecycle::new();
        let connects = Arc::new(AtomicUsize::new(0));
        let guard = lifecycle.on_connect(counting_observer(connects.clone()));

        lifecycle.set_connected(true);
        guard.unregister();
        guard.unregister();
        lifecycle.set_connected(false);
        lifecycle.set_connected(true);

        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_guard_unregisters() {
        let lifecycle = ConnectionLifecycle::new();
        let connects = Arc::new(AtomicUsize::new(0));
        {
            let _guard = lifecycle.on_connect(counting_observer(connects.clone()));
        }
        lifecycle.set_connected(true);
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }
}
