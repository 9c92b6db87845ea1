//! # Pulse Events
//!
//! The realtime core of the dashboard client: the listener registry,
//! the connection lifecycle manager, the backend sync scheduler, and the
//! wire envelope shared by both transports.
//!
//! This crate owns all subscription bookkeeping and none of the I/O. The
//! transports feed it decoded frames through [`registry::EventRegistry::notify`]
//! and receive reconciliations through the [`scheduler::SubscriptionSink`] trait.

// Declare the modules that make up this crate.
pub mod error;
pub mod lifecycle;
pub mod messages;
pub mod registry;
pub mod scheduler;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use lifecycle::{ConnectionLifecycle, LifecycleObserver, ObserverGuard};
pub use messages::{EventFrame, SubscriptionUpdate, decode_frame};
pub use registry::{EventRegistry, Listener, Subscription};
pub use scheduler::{SubscriptionSink, SyncScheduler};
