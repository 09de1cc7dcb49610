//! Unified TTS server entrypoint

use clap::Parser;
use tracing_subscriber::EnvFilter;

use unified_tts::config::Config;
use unified_tts::server;

/// OpenAI-compatible TTS gateway over multiple backends
#[derive(Parser)]
#[command(name = "unified-tts", version)]
struct Cli {
    /// Bind address, overriding UNIFIED_TTS_HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding UNIFIED_TTS_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("unified_tts={default_level}"))),
        )
        .init();

    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    server::run(config).await
}
