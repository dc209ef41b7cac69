//! Per-session bounded outbound queue.
//!
//! The registry holds the only long-lived [`Mailbox`] writer of a session, so
//! removing a session from the registry closes its mailbox: the write pump
//! drains what is left and then sees the end of the channel. Removal also
//! cancels the mailbox's eviction token, which tells the owning session to
//! close its connection even when the write pump is stuck on a stalled peer.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Reading side of a mailbox, owned by the session's write pump
pub type MailboxReceiver = mpsc::Receiver<String>;

/// Result of a non-blocking enqueue.
///
/// `Overflowed` and `Detached` both mean the session must be removed; the
/// broadcast engine never waits on a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The message was queued
    Delivered,
    /// The mailbox is full: the receiver is not keeping up
    Overflowed,
    /// The write pump is gone
    Detached,
}

/// Writing side of a session's mailbox
#[derive(Debug, Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<String>,
    eviction: CancellationToken,
}

impl Mailbox {
    /// Create a mailbox holding at most `capacity` messages (at least one).
    pub fn channel(capacity: usize) -> (Mailbox, MailboxReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let mailbox = Mailbox {
            sender,
            eviction: CancellationToken::new(),
        };
        (mailbox, receiver)
    }

    /// Enqueue without waiting
    pub fn offer(&self, message: String) -> DeliveryOutcome {
        match self.sender.try_send(message) {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => DeliveryOutcome::Overflowed,
            Err(mpsc::error::TrySendError::Closed(_)) => DeliveryOutcome::Detached,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Token cancelled once the session owning this mailbox leaves the registry
    pub fn eviction(&self) -> CancellationToken {
        self.eviction.clone()
    }

    /// Tell the owning session it has been removed
    pub fn evict(&self) {
        self.eviction.cancel();
    }
}
