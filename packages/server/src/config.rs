//! Server configuration.

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Default number of outbound messages buffered per session
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Runtime configuration of the relay server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to (host:port)
    pub addr: String,
    /// Capacity of each session's mailbox; a session whose mailbox fills up
    /// is disconnected
    pub mailbox_capacity: usize,
}

impl ServerConfig {
    pub fn new(addr: impl Into<String>, mailbox_capacity: usize) -> Self {
        Self {
            addr: addr.into(),
            mailbox_capacity: mailbox_capacity.max(1),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ADDR, DEFAULT_MAILBOX_CAPACITY)
    }
}
