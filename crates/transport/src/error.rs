use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported endpoint scheme for the socket transport: {0}")]
    UnsupportedScheme(String),
}
