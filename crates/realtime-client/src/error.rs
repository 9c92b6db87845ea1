use thiserror::Error;
use transport::TransportError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to initialize the transport: {0}")]
    Transport(#[from] TransportError),
}
