//! Line-based WebSocket chat client.
//!
//! Connects to a Hiroba server, sends each typed line and prints every line the
//! server broadcasts. Type `exit` (or press Ctrl+C / Ctrl+D) to leave.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --username alice
//! cargo run --bin hiroba-client -- -a 127.0.0.1:8080
//! ```

use clap::Parser;

use hiroba_client::{domain::ws_url, prompt_username, run_client};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "WebSocket chat client for the Hiroba relay", long_about = None)]
struct Args {
    /// Server address (host:port)
    #[arg(short = 'a', long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Display name; prompted for when omitted ("anonymous" gets a generated name)
    #[arg(short = 'u', long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let username = match args.username {
        Some(name) => name,
        None => match prompt_username() {
            Ok(name) => name,
            Err(e) => {
                tracing::error!("Failed to read username: {}", e);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = run_client(ws_url(&args.addr), username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
