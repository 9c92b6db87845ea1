//! # Pulse Core Types
//!
//! Foundational vocabulary shared by every other crate in the workspace.
//! As a Layer 0 crate it has no dependencies and performs no I/O.

pub mod keys;

// Re-export the core types to provide a clean public API.
pub use keys::EventKey;
