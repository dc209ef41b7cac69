//! SessionRegistry trait 定義
//!
//! 接続中のセッションの一覧（name → mailbox）へのインターフェース。
//! UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
//!
//! ## 不変条件
//!
//! - 同じ名前のセッションは同時に 1 つしか登録されない
//! - 登録されている名前のセッションは生存していると見なされる
//! - 削除は冪等で、別の SessionId が保持している名前は削除しない

use async_trait::async_trait;

use super::{
    error::{IdentityError, RegistryError},
    identity::RequestedName,
    mailbox::Mailbox,
    username::{SessionHandle, Username},
};

/// A registered session as seen by the broadcast engine
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub handle: SessionHandle,
    pub mailbox: Mailbox,
    /// Unix timestamp (milliseconds) of admission
    pub connected_at: i64,
}

/// Public view of a registered session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub username: Username,
    pub connected_at: i64,
}

/// Session Registry trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// 名前の検証と登録を 1 つの排他区間で行う
    ///
    /// `Anonymous` の場合は未使用の `anonymous<n>` を生成する。
    async fn reserve(
        &self,
        requested: RequestedName,
        mailbox: Mailbox,
    ) -> Result<SessionHandle, IdentityError>;

    /// 検証済みのセッションを登録する（名前が使用中なら NameTaken）
    async fn insert(&self, handle: SessionHandle, mailbox: Mailbox) -> Result<(), RegistryError>;

    /// セッションを削除する。削除した場合のみ true
    async fn remove(&self, handle: &SessionHandle) -> bool;

    /// 名前が登録済みか
    async fn contains(&self, name: &Username) -> bool;

    /// 匿名カウンタを進めて未使用の匿名名を返す
    async fn next_anonymous_name(&self) -> Username;

    /// 登録済みセッションのある時点での一覧
    async fn snapshot(&self) -> Vec<SessionEntry>;

    /// 登録済みセッションの公開情報（順序は不定）
    async fn participants(&self) -> Vec<Participant>;

    /// 登録済みセッション数
    async fn count(&self) -> usize;
}
