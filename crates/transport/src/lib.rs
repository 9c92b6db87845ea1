//! # Pulse Transport
//!
//! The two wire adapters behind the realtime core: a persistent
//! server-to-client event stream with out-of-band reconciliation, and a
//! bidirectional socket with in-band control frames. Both decode
//! inbound frames through the shared envelope and feed the listener
//! registry; both drop reconciliations while disconnected.

use std::sync::Arc;

use events::scheduler::SubscriptionSink;

// Declare the modules that make up this crate.
pub mod error;
pub mod socket;
pub mod stream;

// Re-export the core types to provide a clean public API.
pub use error::TransportError;
pub use socket::SocketTransport;
pub use stream::StreamTransport;

/// A physical realtime channel.
///
/// A transport owns the connection, reports liveness through the
/// connection lifecycle, dispatches decoded frames to the registry, and
/// implements the backend half of reconciliation via
/// [`SubscriptionSink`].
pub trait Transport: SubscriptionSink {
    /// Spawns the background connection task and returns immediately.
    /// Liveness is observed through the connection lifecycle hooks, not
    /// through this call.
    fn connect(self: Arc<Self>);
}
