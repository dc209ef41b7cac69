//! Domain logic for client-side operations.
//!
//! Pure functions without side effects, so they are easy to test.

/// Name the server replaces with a synthesised `anonymous<n>`
pub const ANONYMOUS_NAME: &str = "anonymous";

/// Line that closes the connection
pub const EXIT_COMMAND: &str = "exit";

/// Build the WebSocket endpoint URL from a `host:port` address
pub fn ws_url(addr: &str) -> String {
    format!("ws://{}/ws", addr)
}

/// Resolve the name typed at the prompt. A blank answer means anonymous.
pub fn resolve_username(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Check if the typed line asks to leave the chat
pub fn is_exit_command(line: &str) -> bool {
    line.trim() == EXIT_COMMAND
}

/// Split an incoming frame into lines; coalesced frames carry several `name: text` lines
pub fn split_frame(frame: &str) -> impl Iterator<Item = &str> {
    frame.split('\n').filter(|line| !line.is_empty())
}

/// Prefix a received line with the local clock time
pub fn format_incoming(clock_time: &str, line: &str) -> String {
    format!("[{}] {}", clock_time, line)
}

/// Human readable reason for a rejected handshake.
///
/// The server answers 401 with the reason as the body; fall back to the status
/// when the body is missing or empty.
pub fn rejection_reason(status: u16, body: Option<&[u8]>) -> String {
    match body.map(String::from_utf8_lossy) {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => format!("HTTP {}", status),
    }
}
