//! UseCase: 接続中の参加者一覧の取得

use std::sync::Arc;

use crate::domain::{Participant, SessionRegistry};

/// 参加者一覧取得のユースケース
pub struct ListParticipantsUseCase {
    /// Registry（接続中セッションの抽象化）
    registry: Arc<dyn SessionRegistry>,
}

impl ListParticipantsUseCase {
    /// 新しい ListParticipantsUseCase を作成
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者一覧を username 順で返す
    pub async fn execute(&self) -> Vec<Participant> {
        let mut participants = self.registry.participants().await;
        participants.sort_by(|a, b| a.username.cmp(&b.username));
        participants
    }
}
