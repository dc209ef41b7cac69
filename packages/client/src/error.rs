//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the handshake (name missing, invalid or taken)
    #[error("Connection rejected by server: {0}")]
    NameRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
