//! Messages travelling from read pumps to the broadcast engine.

use tokio::sync::mpsc;

use super::username::Username;

/// A message received from one session, not yet fanned out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: Username,
    pub payload: String,
}

impl InboundMessage {
    pub fn new(sender: Username, payload: impl Into<String>) -> Self {
        Self {
            sender,
            payload: payload.into(),
        }
    }

    /// Wire form delivered to every session: `"<sender>: <payload>"`
    pub fn format(&self) -> String {
        format!("{}: {}", self.sender, self.payload)
    }
}

/// Producer side of the shared broadcast channel, cloned into every read pump
pub type BroadcastSender = mpsc::UnboundedSender<InboundMessage>;

/// Consumer side of the shared broadcast channel, owned by the broadcast engine
pub type BroadcastReceiver = mpsc::UnboundedReceiver<InboundMessage>;

pub fn broadcast_channel() -> (BroadcastSender, BroadcastReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prefixes_sender_name() {
        // テスト項目: 配信形式は "<name>: <text>" になる
        // given (前提条件):
        let message = InboundMessage::new(Username::new("bob").unwrap(), "hi");

        // when (操作):
        let formatted = message.format();

        // then (期待する結果):
        assert_eq!(formatted, "bob: hi");
    }

    #[test]
    fn test_format_keeps_payload_verbatim() {
        // テスト項目: 本文はそのまま（コロンや空白を含んでも）保持される
        // given (前提条件):
        let message = InboundMessage::new(Username::new("alice").unwrap(), " a: b ");

        // then (期待する結果):
        assert_eq!(message.format(), "alice:  a: b ");
    }
}
