use std::time::Duration;

use serde::Deserialize;

/// The root configuration structure for the realtime tools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Connection parameters for the realtime layer.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Origin of the dashboard backend (e.g., "http://127.0.0.1:8080").
    /// The transports derive their own endpoints from it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Which wire transport carries the event feed.
    #[serde(default)]
    pub transport: TransportKind,

    /// Seconds to wait before re-opening a dropped connection.
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_delay_secs: u64,
}

impl RealtimeConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            transport: TransportKind::default(),
            reconnect_delay_secs: default_reconnect_secs(),
        }
    }
}

/// Selects between the two wire transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum TransportKind {
    /// Persistent server-to-client event stream; reconciliation goes
    /// out of band over HTTP.
    #[default]
    Stream,
    /// Bidirectional socket; reconciliation is an in-band control frame.
    Socket,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_reconnect_secs() -> u64 {
    5
}
