//! Server state shared by every handler.

use std::sync::Arc;

use crate::{
    domain::BroadcastSender,
    usecase::{AdmitClientUseCase, DisconnectClientUseCase, ListParticipantsUseCase},
};

/// Shared application state
pub struct AppState {
    /// AdmitClientUseCase（クライアント受け入れのユースケース）
    pub admit_client_usecase: Arc<AdmitClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// ListParticipantsUseCase（参加者一覧取得のユースケース）
    pub list_participants_usecase: Arc<ListParticipantsUseCase>,
    /// Producer side of the broadcast channel, cloned into every read pump
    pub broadcast_tx: BroadcastSender,
}
