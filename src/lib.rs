use crate::http::protocol::HttpError;
use thiserror::Error;

/// Error types for the echo-headers library
#[derive(Error, Debug)]
pub enum EchoError {
    /// TCP-related errors (bind, accept, connect, read, write)
    #[error("TCP error: {0}")]
    Tcp(#[from] std::io::Error),

    /// HTTP framing errors that are not plain I/O failures
    #[error("HTTP error: {0}")]
    Http(HttpError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// UTF-8 encoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<HttpError> for EchoError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Io(e) => EchoError::Tcp(e),
            other => EchoError::Http(other),
        }
    }
}

/// Result type for the echo-headers library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod cli;
pub mod common;
pub mod diagnostics;
pub mod http;

// Re-export main types for convenience
pub use crate::common::{EchoClient, EchoServerTrait};
pub use crate::diagnostics::{ConnectionTracker, DiagnosticSnapshot};
pub use crate::http::{HttpConfig, HttpEchoClient, HttpEchoServer};
