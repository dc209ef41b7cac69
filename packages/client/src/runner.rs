//! Client execution logic.

use super::{error::ClientError, session::run_client_session};

/// Run the WebSocket client until the user leaves or the connection ends.
///
/// A rejected handshake is reported on stderr and returned as an error.
pub async fn run_client(url: String, username: String) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Connecting to {} as '{}'", url, username);

    match run_client_session(&url, &username).await {
        Ok(()) => {
            tracing::info!("Client session ended normally");
            Ok(())
        }
        Err(e) => {
            if let Some(ClientError::NameRejected(reason)) = e.downcast_ref::<ClientError>() {
                eprintln!("Server rejected the name '{}': {}", username, reason);
            }
            Err(e)
        }
    }
}
