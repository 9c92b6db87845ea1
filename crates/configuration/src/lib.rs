//! # Pulse Configuration
//!
//! Typed settings for the realtime tools, loaded from `config.toml`
//! and `PULSE_*` environment variables.

use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, RealtimeConfig, TransportKind};

/// Loads the application configuration.
///
/// The `config.toml` file is optional; every field has a default, and
/// environment variables with the `PULSE` prefix override the file
/// (e.g. `PULSE_REALTIME__BASE_URL`).
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("PULSE").separator("__"))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(config)
}

/// Loads configuration from a literal TOML document. The same defaults
/// and validation apply as in [`load_config`].
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(config)
}

fn validate(config: Config) -> Result<Config, ConfigError> {
    if config.realtime.reconnect_delay_secs == 0 {
        return Err(ConfigError::ValidationError(
            "reconnect_delay_secs must be at least 1".to_string(),
        ));
    }
    Ok(config)
}
