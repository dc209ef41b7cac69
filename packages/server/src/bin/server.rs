//! Hiroba relay server.
//!
//! Every text message a client sends is broadcast to all connected clients
//! (the sender included) as `"<name>: <text>"`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --addr 0.0.0.0:3000
//! ```

use clap::Parser;
use hiroba_server::{
    ServerConfig,
    config::{DEFAULT_ADDR, DEFAULT_MAILBOX_CAPACITY},
    ui::Server,
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "WebSocket chat relay with broadcast support", long_about = None)]
struct Args {
    /// Address to listen on (host:port)
    #[arg(short = 'a', long, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Messages buffered per client before a slow client is disconnected (at least 1)
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    mailbox_capacity: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = ServerConfig::new(args.addr, args.mailbox_capacity);

    // Registry -> UseCases -> Server の順に組み立てる
    let server = Server::from_config(&config);
    if let Err(e) = server.run(&config.addr).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
