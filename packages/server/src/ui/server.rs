//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{SessionRegistry, broadcast_channel},
    infrastructure::registry::InMemorySessionRegistry,
    usecase::{
        AdmitClientUseCase, BroadcastMessageUseCase, DisconnectClientUseCase,
        ListParticipantsUseCase,
    },
};

use super::{
    handler::{get_participants, health_check, websocket_handler, welcome},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     admit_client_usecase,
///     disconnect_client_usecase,
///     broadcast_message_usecase,
///     list_participants_usecase,
/// );
/// server.run("127.0.0.1:8080").await?;
/// ```
pub struct Server {
    /// AdmitClientUseCase（クライアント受け入れのユースケース）
    admit_client_usecase: Arc<AdmitClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// BroadcastMessageUseCase（ブロードキャストのユースケース）
    broadcast_message_usecase: Arc<BroadcastMessageUseCase>,
    /// ListParticipantsUseCase（参加者一覧取得のユースケース）
    list_participants_usecase: Arc<ListParticipantsUseCase>,
}

impl Server {
    /// Create a new Server instance from its use cases
    pub fn new(
        admit_client_usecase: Arc<AdmitClientUseCase>,
        disconnect_client_usecase: Arc<DisconnectClientUseCase>,
        broadcast_message_usecase: Arc<BroadcastMessageUseCase>,
        list_participants_usecase: Arc<ListParticipantsUseCase>,
    ) -> Self {
        Self {
            admit_client_usecase,
            disconnect_client_usecase,
            broadcast_message_usecase,
            list_participants_usecase,
        }
    }

    /// Wire every use case to one shared registry
    pub fn with_registry(registry: Arc<dyn SessionRegistry>, mailbox_capacity: usize) -> Self {
        Self::new(
            Arc::new(AdmitClientUseCase::new(registry.clone(), mailbox_capacity)),
            Arc::new(DisconnectClientUseCase::new(registry.clone())),
            Arc::new(BroadcastMessageUseCase::new(registry.clone())),
            Arc::new(ListParticipantsUseCase::new(registry)),
        )
    }

    /// Server backed by a fresh in-memory registry
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_registry(
            Arc::new(InMemorySessionRegistry::new()),
            config.mailbox_capacity,
        )
    }

    /// Spawn the broadcast engine and build the router.
    ///
    /// Must be called from within a tokio runtime.
    pub fn into_router(self) -> Router {
        let (broadcast_tx, broadcast_rx) = broadcast_channel();

        let engine = self.broadcast_message_usecase;
        tokio::spawn(async move { engine.run(broadcast_rx).await });

        let app_state = Arc::new(AppState {
            admit_client_usecase: self.admit_client_usecase,
            disconnect_client_usecase: self.disconnect_client_usecase,
            list_participants_usecase: self.list_participants_usecase,
            broadcast_tx,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/", get(welcome))
            .route("/api/health", get(health_check))
            .route("/api/participants", get(get_participants))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the relay server
    ///
    /// # Arguments
    ///
    /// * `addr` - The address to bind to (e.g., "127.0.0.1:8080")
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.into_router();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Relay server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
