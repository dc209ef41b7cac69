//! UI layer: HTTP/WebSocket entry points of the relay server.

mod handler;
mod server;
mod session;
mod signal;
pub mod state;

pub use handler::USERNAME_HEADER;
pub use server::Server;
pub use session::{ClientSession, ReadEnd, WriteEnd, coalesce, read_pump, write_pump};
