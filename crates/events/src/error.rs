use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventsError {
    #[error("Failed to decode inbound event frame: {0}")]
    Decode(String),

    #[error("Failed to serialize event message: {0}")]
    Serialization(String),

    #[error("Failed to push the subscription set to the backend: {0}")]
    Sync(String),
}
