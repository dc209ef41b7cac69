//! WebSocket connection handler (admission).

use std::sync::Arc;

use axum::{
    extract::{State, ws::WebSocketUpgrade},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    ui::{session::ClientSession, state::AppState},
    usecase::Admission,
};

/// Request header carrying the requested display name. The upgrade response
/// echoes the assigned name in the same header.
pub const USERNAME_HEADER: &str = "username";

/// Admit a client and upgrade the connection.
///
/// The name is validated and reserved before the upgrade; a rejected client
/// gets `401 Unauthorized` with the reason as the body and is never upgraded.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let values: Vec<&HeaderValue> = headers.get_all(USERNAME_HEADER).iter().collect();

    let admission = state
        .admit_client_usecase
        .execute(values.as_slice())
        .await;
    let Admission {
        handle,
        mailbox,
        eviction,
    } = match admission {
        Ok(admission) => admission,
        Err(e) => {
            tracing::warn!("Rejecting connection: {}", e);
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    tracing::info!("Client '{}' admitted ({})", handle.name, handle.id);

    let assigned_name = HeaderValue::from_str(handle.name.as_str()).ok();
    let session = ClientSession::new(
        handle.clone(),
        mailbox,
        eviction,
        state.broadcast_tx.clone(),
        state.disconnect_client_usecase.clone(),
    );

    // Release the reservation if the handshake never completes
    let disconnect = state.disconnect_client_usecase.clone();
    let mut response = ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade for '{}' failed: {}", handle.name, e);
            tokio::spawn(async move {
                disconnect.execute(&handle).await;
            });
        })
        .on_upgrade(move |socket| session.run(socket));

    if let Some(value) = assigned_name {
        response.headers_mut().insert(USERNAME_HEADER, value);
    }
    response
}
