//! Line-based terminal client for the Hiroba chat relay.

pub mod domain;
pub mod error;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
pub use ui::prompt_username;
