//! UseCase: クライアントの切断処理

use std::sync::Arc;

use crate::domain::{SessionHandle, SessionRegistry};

/// クライアント切断のユースケース
///
/// 読み込みポンプ・書き込みポンプ・ブロードキャストのいずれから呼ばれてもよく、
/// 何度呼ばれても Registry は壊れない。
pub struct DisconnectClientUseCase {
    /// Registry（接続中セッションの抽象化）
    registry: Arc<dyn SessionRegistry>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// このセッションを Registry から削除した場合は `true`、既に削除済みなら `false`
    pub async fn execute(&self, handle: &SessionHandle) -> bool {
        let removed = self.registry.remove(handle).await;
        if removed {
            tracing::info!("Client '{}' removed from registry", handle.name);
        } else {
            tracing::debug!("Client '{}' was already removed", handle.name);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Mailbox, MockSessionRegistry, RequestedName, Username},
        infrastructure::registry::InMemorySessionRegistry,
    };

    #[tokio::test]
    async fn test_disconnect_twice_is_harmless() {
        // テスト項目: 同じセッションを 2 回切断しても 1 回目だけが削除する
        // given (前提条件):
        let registry = Arc::new(InMemorySessionRegistry::new());
        let (mailbox, _rx) = Mailbox::channel(4);
        let handle = registry
            .reserve(RequestedName::Named(Username::new("alice").unwrap()), mailbox)
            .await
            .unwrap();
        let usecase = DisconnectClientUseCase::new(registry.clone());

        // when (操作):
        let first = usecase.execute(&handle).await;
        let second = usecase.execute(&handle).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_delegates_to_registry_remove() {
        // テスト項目: 切断は Registry の remove を 1 回だけ呼ぶ
        // given (前提条件):
        let handle = SessionHandle::new(Username::new("bob").unwrap());
        let expected = handle.clone();
        let mut registry = MockSessionRegistry::new();
        registry
            .expect_remove()
            .withf(move |h: &SessionHandle| *h == expected)
            .times(1)
            .returning(|_| false);
        let usecase = DisconnectClientUseCase::new(Arc::new(registry));

        // when (操作):
        let removed = usecase.execute(&handle).await;

        // then (期待する結果):
        assert!(!removed);
    }
}
