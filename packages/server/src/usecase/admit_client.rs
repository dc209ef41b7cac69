//! UseCase: クライアントの受け入れ処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AdmitClientUseCase::validate()（名前の検証のみ、登録はしない）
//! - AdmitClientUseCase::execute()（検証と登録を 1 回の排他区間で行う）
//!
//! ### どのような状況を想定しているか
//! - 正常系：通常の名前、anonymous
//! - 異常系：ヘッダーなし、複数ヘッダー、使用中の名前

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::{
    IdentityError, Mailbox, MailboxReceiver, RequestedName, SessionHandle, SessionRegistry,
    Username, parse_identity,
};

/// A successfully admitted client: its registered handle, the reading side
/// of its mailbox and the token cancelled when the registry drops it
#[derive(Debug)]
pub struct Admission {
    pub handle: SessionHandle,
    pub mailbox: MailboxReceiver,
    pub eviction: CancellationToken,
}

/// クライアント受け入れのユースケース
pub struct AdmitClientUseCase {
    /// Registry（接続中セッションの抽象化）
    registry: Arc<dyn SessionRegistry>,
    /// 各セッションの mailbox 容量
    mailbox_capacity: usize,
}

impl AdmitClientUseCase {
    /// 新しい AdmitClientUseCase を作成
    pub fn new(registry: Arc<dyn SessionRegistry>, mailbox_capacity: usize) -> Self {
        Self {
            registry,
            mailbox_capacity,
        }
    }

    /// 識別ヘッダーから名前を導出する（登録はしない）
    ///
    /// `anonymous` の場合は匿名カウンタを進めて新しい名前を返す。それ以外は
    /// Registry を参照し、使用中であれば `NameTaken` を返す。
    ///
    /// 検証と登録の間に別の接続が同じ名前を取る可能性があるため、接続の受け入れには
    /// [`execute`](Self::execute) を使うこと。
    pub async fn validate<V: AsRef<[u8]>>(&self, values: &[V]) -> Result<Username, IdentityError> {
        match parse_identity(values)? {
            RequestedName::Anonymous => Ok(self.registry.next_anonymous_name().await),
            RequestedName::Named(name) => {
                if self.registry.contains(&name).await {
                    tracing::warn!("Username '{}' already exists", name);
                    return Err(IdentityError::NameTaken(name.as_str().to_string()));
                }
                Ok(name)
            }
        }
    }

    /// クライアントの受け入れを実行
    ///
    /// # Returns
    ///
    /// * `Ok(Admission)` - 登録済みのセッションと mailbox の受信側
    /// * `Err(IdentityError)` - 受け入れ拒否（Registry は変更されない）
    pub async fn execute<V: AsRef<[u8]>>(&self, values: &[V]) -> Result<Admission, IdentityError> {
        let requested = parse_identity(values)?;
        let (mailbox, receiver) = Mailbox::channel(self.mailbox_capacity);
        let eviction = mailbox.eviction();

        let handle = self.registry.reserve(requested, mailbox).await?;

        Ok(Admission {
            handle,
            mailbox: receiver,
            eviction,
        })
    }
}
