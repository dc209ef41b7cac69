//! InMemory Session Registry 実装
//!
//! ドメイン層が定義する SessionRegistry trait の具体的な実装。
//! セッションの一覧と匿名カウンタを 1 つの `RwLock` で保護します。
//! 参照（snapshot, contains）は共有ロック、変更（reserve, insert, remove,
//! 匿名カウンタ）は排他ロックで行います。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::RwLock;

use crate::domain::{
    IdentityError, Mailbox, Participant, RegistryError, RequestedName, SessionEntry,
    SessionHandle, SessionRegistry, Username,
};

/// Lock-protected registry state
#[derive(Default)]
struct RegistryState {
    sessions: HashMap<Username, SessionEntry>,
    /// Next candidate for `anonymous<n>`; starts at 0 and is never reset
    anonymous_counter: u64,
}

impl RegistryState {
    /// Advance the counter past any name already in use.
    fn next_anonymous_name(&mut self) -> Username {
        loop {
            let candidate = Username::anonymous(self.anonymous_counter);
            self.anonymous_counter += 1;
            if !self.sessions.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn insert(&mut self, entry: SessionEntry) -> Result<(), RegistryError> {
        let name = entry.handle.name.clone();
        if self.sessions.contains_key(&name) {
            return Err(RegistryError::NameTaken(name.as_str().to_string()));
        }
        self.sessions.insert(name, entry);
        Ok(())
    }
}

/// インメモリ Session Registry 実装
pub struct InMemorySessionRegistry {
    state: RwLock<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionRegistry {
    /// 新しい InMemorySessionRegistry を作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 接続時刻の取得元を指定して作成（テスト用）
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            clock,
        }
    }

    fn entry(&self, handle: SessionHandle, mailbox: Mailbox) -> SessionEntry {
        SessionEntry {
            handle,
            mailbox,
            connected_at: self.clock.now_millis(),
        }
    }
}

impl Default for InMemorySessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn reserve(
        &self,
        requested: RequestedName,
        mailbox: Mailbox,
    ) -> Result<SessionHandle, IdentityError> {
        let mut state = self.state.write().await;

        let name = match requested {
            RequestedName::Anonymous => state.next_anonymous_name(),
            RequestedName::Named(name) => name,
        };
        let handle = SessionHandle::new(name);
        state.insert(self.entry(handle.clone(), mailbox))?;

        tracing::debug!(
            "Session '{}' ({}) reserved",
            handle.name,
            handle.id
        );
        Ok(handle)
    }

    async fn insert(&self, handle: SessionHandle, mailbox: Mailbox) -> Result<(), RegistryError> {
        let entry = self.entry(handle, mailbox);
        let mut state = self.state.write().await;
        state.insert(entry)
    }

    async fn remove(&self, handle: &SessionHandle) -> bool {
        let mut state = self.state.write().await;
        match state.sessions.get(&handle.name) {
            Some(entry) if entry.handle.id == handle.id => {
                if let Some(entry) = state.sessions.remove(&handle.name) {
                    entry.mailbox.evict();
                }
                tracing::debug!("Session '{}' ({}) removed", handle.name, handle.id);
                true
            }
            _ => false,
        }
    }

    async fn contains(&self, name: &Username) -> bool {
        let state = self.state.read().await;
        state.sessions.contains_key(name)
    }

    async fn next_anonymous_name(&self) -> Username {
        let mut state = self.state.write().await;
        state.next_anonymous_name()
    }

    async fn snapshot(&self) -> Vec<SessionEntry> {
        let state = self.state.read().await;
        state.sessions.values().cloned().collect()
    }

    async fn participants(&self) -> Vec<Participant> {
        let state = self.state.read().await;
        state
            .sessions
            .values()
            .map(|entry| Participant {
                username: entry.handle.name.clone(),
                connected_at: entry.connected_at,
            })
            .collect()
    }

    async fn count(&self) -> usize {
        let state = self.state.read().await;
        state.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryOutcome, MailboxReceiver};
    use hiroba_shared::time::FixedClock;
    use std::collections::HashSet;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 名前の一意性（reserve / insert）
    // - 匿名名の生成（連番、使用中の名前のスキップ、並行時の一意性）
    // - 削除の冪等性と SessionId による保護
    // - snapshot が登録済みの全セッションを返すこと
    //
    // 【なぜこのテストが必要か】
    // - Registry は「誰が接続しているか」の唯一の情報源
    // - 並行な接続・切断でも不変条件が崩れないことを保証する必要がある
    // ========================================

    fn named(name: &str) -> RequestedName {
        RequestedName::Named(Username::new(name).unwrap())
    }

    fn mailbox() -> (Mailbox, MailboxReceiver) {
        Mailbox::channel(8)
    }

    #[tokio::test]
    async fn test_reserve_named_session() {
        // テスト項目: 未使用の名前で登録できる
        // given (前提条件):
        let registry = InMemorySessionRegistry::with_clock(Arc::new(FixedClock::new(1000)));
        let (mb, _rx) = mailbox();

        // when (操作):
        let handle = registry.reserve(named("alice"), mb).await.unwrap();

        // then (期待する結果):
        assert_eq!(handle.name.as_str(), "alice");
        assert_eq!(registry.count().await, 1);
        assert!(registry.contains(&handle.name).await);
        assert_eq!(
            registry.participants().await,
            vec![Participant {
                username: handle.name.clone(),
                connected_at: 1000,
            }]
        );
    }

    #[tokio::test]
    async fn test_reserve_taken_name_leaves_registry_unchanged() {
        // テスト項目: 使用中の名前は NameTaken になり、Registry は変化しない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();
        let first = registry.reserve(named("bob"), mb1).await.unwrap();

        // when (操作):
        let result = registry.reserve(named("bob"), mb2).await;

        // then (期待する結果):
        assert_eq!(result, Err(IdentityError::NameTaken("bob".to_string())));
        assert_eq!(registry.count().await, 1);
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot[0].handle, first);
    }

    #[tokio::test]
    async fn test_reserve_anonymous_uses_counter() {
        // テスト項目: anonymous の要求には anonymous0, anonymous1, ... が順に割り当てられる
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();

        // when (操作):
        let first = registry.reserve(RequestedName::Anonymous, mb1).await.unwrap();
        let second = registry.reserve(RequestedName::Anonymous, mb2).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.name.as_str(), "anonymous0");
        assert_eq!(second.name.as_str(), "anonymous1");
    }

    #[tokio::test]
    async fn test_anonymous_counter_is_not_reused_after_disconnect() {
        // テスト項目: 切断後もカウンタは戻らない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();
        let first = registry.reserve(RequestedName::Anonymous, mb1).await.unwrap();
        registry.remove(&first).await;

        // when (操作):
        let second = registry.reserve(RequestedName::Anonymous, mb2).await.unwrap();

        // then (期待する結果):
        assert_eq!(second.name.as_str(), "anonymous1");
    }

    #[tokio::test]
    async fn test_anonymous_skips_explicitly_taken_names() {
        // テスト項目: anonymous<n> が明示的に使われていれば、その番号は飛ばされる
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();
        registry.reserve(named("anonymous0"), mb1).await.unwrap();

        // when (操作):
        let handle = registry.reserve(RequestedName::Anonymous, mb2).await.unwrap();

        // then (期待する結果):
        assert_eq!(handle.name.as_str(), "anonymous1");
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test]
    async fn test_next_anonymous_name_does_not_register() {
        // テスト項目: next_anonymous_name はカウンタを進めるだけで登録はしない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();

        // when (操作):
        let first = registry.next_anonymous_name().await;
        let second = registry.next_anonymous_name().await;

        // then (期待する結果):
        assert_eq!(first.as_str(), "anonymous0");
        assert_eq!(second.as_str(), "anonymous1");
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_anonymous_reservations_are_unique() {
        // テスト項目: 並行に anonymous を要求しても全て異なる名前になる
        // given (前提条件):
        let registry = Arc::new(InMemorySessionRegistry::new());
        let n = 64;

        // when (操作):
        let mut tasks = Vec::new();
        for _ in 0..n {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (mb, rx) = Mailbox::channel(8);
                let handle = registry.reserve(RequestedName::Anonymous, mb).await.unwrap();
                (handle, rx)
            }));
        }
        let mut names = HashSet::new();
        let mut receivers = Vec::new();
        for task in tasks {
            let (handle, rx) = task.await.unwrap();
            names.insert(handle.name);
            receivers.push(rx);
        }

        // then (期待する結果):
        assert_eq!(names.len(), n);
        assert_eq!(registry.count().await, n);
        for k in 0..n as u64 {
            assert!(names.contains(&Username::anonymous(k)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_of_same_name_admit_exactly_one() {
        // テスト項目: 同じ名前の並行登録は 1 つだけ成功する
        // given (前提条件):
        let registry = Arc::new(InMemorySessionRegistry::new());

        // when (操作):
        let mut tasks = Vec::new();
        for _ in 0..32 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (mb, _rx) = Mailbox::channel(8);
                registry.reserve(named("carol"), mb).await
            }));
        }
        let mut admitted = 0;
        let mut rejected = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(IdentityError::NameTaken(_)) => rejected += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // then (期待する結果):
        assert_eq!(admitted, 1);
        assert_eq!(rejected, 31);
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_taken_name() {
        // テスト項目: insert は使用中の名前に対して NameTaken を返す
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();
        let name = Username::new("dave").unwrap();
        registry
            .insert(SessionHandle::new(name.clone()), mb1)
            .await
            .unwrap();

        // when (操作):
        let result = registry.insert(SessionHandle::new(name), mb2).await;

        // then (期待する結果):
        assert_eq!(result, Err(RegistryError::NameTaken("dave".to_string())));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        // テスト項目: 同じセッションを 2 回削除しても問題ない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb, _rx) = mailbox();
        let handle = registry.reserve(named("erin"), mb).await.unwrap();

        // when (操作):
        let first = registry.remove(&handle).await;
        let second = registry.remove(&handle).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_stale_remove_keeps_newer_session_with_same_name() {
        // テスト項目: 古いセッションの削除要求は、同名の新しいセッションを消さない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();
        let old = registry.reserve(named("frank"), mb1).await.unwrap();
        registry.remove(&old).await;
        let new = registry.reserve(named("frank"), mb2).await.unwrap();

        // when (操作):
        let removed = registry.remove(&old).await;

        // then (期待する結果):
        assert!(!removed);
        assert!(registry.contains(&new.name).await);
    }

    #[tokio::test]
    async fn test_remove_closes_mailbox() {
        // テスト項目: 削除すると mailbox が閉じられ、書き込みポンプに終了が伝わる
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb, mut rx) = mailbox();
        let handle = registry.reserve(named("grace"), mb).await.unwrap();

        // when (操作):
        registry.remove(&handle).await;

        // then (期待する結果):
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_remove_evicts_the_session() {
        // テスト項目: 削除すると eviction トークンが取り消され、セッション側に切断が伝わる
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb, _rx) = mailbox();
        let eviction = mb.eviction();
        let handle = registry.reserve(named("heidi"), mb).await.unwrap();
        assert!(!eviction.is_cancelled());

        // when (操作):
        registry.remove(&handle).await;

        // then (期待する結果):
        assert!(eviction.is_cancelled());
    }

    #[tokio::test]
    async fn test_stale_remove_does_not_evict_newer_session() {
        // テスト項目: 古いセッションの削除要求は、同名の新しいセッションを evict しない
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, _rx1) = mailbox();
        let (mb2, _rx2) = mailbox();
        let new_eviction = mb2.eviction();
        let old = registry.reserve(named("ivan"), mb1).await.unwrap();
        registry.remove(&old).await;
        registry.reserve(named("ivan"), mb2).await.unwrap();

        // when (操作):
        registry.remove(&old).await;

        // then (期待する結果):
        assert!(!new_eviction.is_cancelled());
    }

    #[tokio::test]
    async fn test_snapshot_contains_every_session() {
        // テスト項目: snapshot は登録済みの全セッションを含み、その mailbox に書き込める
        // given (前提条件):
        let registry = InMemorySessionRegistry::new();
        let (mb1, mut rx1) = mailbox();
        let (mb2, mut rx2) = mailbox();
        registry.reserve(named("alice"), mb1).await.unwrap();
        registry.reserve(named("bob"), mb2).await.unwrap();

        // when (操作):
        let snapshot = registry.snapshot().await;

        // then (期待する結果):
        let mut names: Vec<&str> = snapshot.iter().map(|e| e.handle.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["alice", "bob"]);
        for entry in &snapshot {
            assert_eq!(
                entry.mailbox.offer("ping".to_string()),
                DeliveryOutcome::Delivered
            );
        }
        assert_eq!(rx1.recv().await.as_deref(), Some("ping"));
        assert_eq!(rx2.recv().await.as_deref(), Some("ping"));
    }
}
