//! UseCase: メッセージのブロードキャスト処理（Broadcast Engine）
//!
//! 共有チャンネルから 1 件ずつメッセージを取り出し、Registry に登録されている
//! 全てのセッション（送信者自身を含む）の mailbox に待たずに投入する。
//!
//! mailbox が満杯のセッションは「受信が追いついていない」と見なして Registry から
//! 削除する（Live → Overflowed → Removed）。削除によって mailbox が閉じられ、
//! そのセッションの書き込みポンプが終了する。送信者や他のセッションは影響を受けない。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 全セッションへの配信（送信者へのエコーを含む）
//! - 満杯の mailbox を持つセッションの切断と、他セッションへの影響がないこと
//! - 送信者ごとの順序保証

use std::sync::Arc;

use crate::domain::{
    BroadcastReceiver, DeliveryOutcome, InboundMessage, SessionRegistry, Username,
};

/// Per-message fan-out result
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of mailboxes the message was queued into
    pub delivered: usize,
    /// Sessions disconnected because their mailbox was full
    pub overflowed: Vec<Username>,
    /// Sessions removed because their write pump was already gone
    pub detached: Vec<Username>,
}

/// メッセージブロードキャストのユースケース
pub struct BroadcastMessageUseCase {
    /// Registry（接続中セッションの抽象化）
    registry: Arc<dyn SessionRegistry>,
}

impl BroadcastMessageUseCase {
    /// 新しい BroadcastMessageUseCase を作成
    pub fn new(registry: Arc<dyn SessionRegistry>) -> Self {
        Self { registry }
    }

    /// 1 件のメッセージを全セッションに配信する
    ///
    /// 配信に失敗したセッションは Registry から削除される。このメソッド自体は失敗しない。
    pub async fn execute(&self, message: &InboundMessage) -> BroadcastReport {
        let text = message.format();
        let mut report = BroadcastReport::default();

        // Each entry (and its mailbox writer) is dropped at the end of its
        // iteration, so a removed session's mailbox closes right away.
        for entry in self.registry.snapshot().await {
            match entry.mailbox.offer(text.clone()) {
                DeliveryOutcome::Delivered => report.delivered += 1,
                DeliveryOutcome::Overflowed => {
                    tracing::warn!(
                        "Session '{}' is not keeping up with broadcasts; disconnecting",
                        entry.handle.name
                    );
                    self.registry.remove(&entry.handle).await;
                    report.overflowed.push(entry.handle.name);
                }
                DeliveryOutcome::Detached => {
                    tracing::debug!(
                        "Session '{}' has no write pump; removing from registry",
                        entry.handle.name
                    );
                    self.registry.remove(&entry.handle).await;
                    report.detached.push(entry.handle.name);
                }
            }
        }

        tracing::debug!(
            "Broadcasted message from '{}' to {} sessions",
            message.sender,
            report.delivered
        );
        report
    }

    /// 共有チャンネルが閉じられるまでブロードキャストを続ける
    pub async fn run(&self, mut inbound: BroadcastReceiver) {
        tracing::info!("Broadcast engine started");
        while let Some(message) = inbound.recv().await {
            self.execute(&message).await;
        }
        tracing::info!("Broadcast channel closed; broadcast engine stopped");
    }
}
