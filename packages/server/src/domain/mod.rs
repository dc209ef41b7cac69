//! Domain layer: identities, mailboxes, messages and the registry contract.
//!
//! このモジュールは tokio のチャンネル以外のインフラには依存しません。
//! 具体的な Registry 実装は Infrastructure 層が提供します（依存性の逆転）。

mod error;
mod identity;
mod mailbox;
mod message;
mod registry;
mod username;

pub use error::{IdentityError, RegistryError, UsernameError};
pub use identity::{RequestedName, parse_identity};
pub use mailbox::{DeliveryOutcome, Mailbox, MailboxReceiver};
pub use message::{BroadcastReceiver, BroadcastSender, InboundMessage, broadcast_channel};
pub use registry::{Participant, SessionEntry, SessionRegistry};
pub use username::{ANONYMOUS, MAX_USERNAME_LEN, SessionHandle, SessionId, Username};

#[cfg(test)]
pub use registry::MockSessionRegistry;
