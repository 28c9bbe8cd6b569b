//! chat-bridge
//!
//! Accepts OpenAI-style chat completion requests and serves them from a
//! DeepSeek-style upstream.
//!
//! ```text
//!     Client ──▶ http::server ──▶ http::session ──▶ translate ──▶ upstream ──▶ DeepSeek
//!                                      │                                         │
//!     Client ◀── http::relay ◀─────────┴──────── pass-through (1 MiB) ◀──────────┘
//! ```
//!
//! The upstream credential comes from `DEEPSEEK_API_KEY`; the process
//! refuses to start without it.

use std::path::PathBuf;

use clap::Parser;

use chat_bridge::config::load_config;
use chat_bridge::lifecycle;
use chat_bridge::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "chat-bridge")]
#[command(about = "OpenAI-compatible chat completions bridge", long_about = None)]
struct Cli {
    /// Optional TOML config file; built-in defaults otherwise.
    #[arg(short, long, env = "CHAT_BRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        tls = config.listener.tls.is_some(),
        "chat-bridge starting"
    );

    lifecycle::start(config).await?;
    Ok(())
}
