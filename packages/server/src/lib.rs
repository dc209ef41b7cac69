//! Hiroba relay server library.
//!
//! Clients connect over WebSocket with a display name, and every text message
//! a client sends is broadcast to all connected clients as `"<name>: <text>"`.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

pub use config::ServerConfig;
