//! Request handlers.

mod http;
mod websocket;

pub use http::{get_participants, health_check, welcome};
pub use websocket::{USERNAME_HEADER, websocket_handler};
