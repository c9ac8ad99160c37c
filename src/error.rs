use thiserror::Error;

/// Failures raised while authenticating or running a user operation
#[derive(Debug, Error)]
pub enum Error {
    /// The session token could not be obtained
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Transport failure while talking to the remote API
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response or local file was not valid JSON
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON was well formed but did not have the expected shape
    #[error("validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
