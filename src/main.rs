//! Huddle Server
//!
//! Run with: cargo run -- serve
//!
//! # Configuration
//!
//! Settings come from a TOML file (`--config`, or the first of
//! `~/.config/huddle/config.toml`, `/etc/huddle/config.toml`,
//! `./config.toml`) with `HUDDLE_*` environment overrides. `RUST_LOG`
//! takes precedence over the configured log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use huddle::api::{serve, AppState};
use huddle::config::{generate_default_config, Config, LoggingConfig};
use huddle::websocket::Hub;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "huddle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Realtime WebSocket fan-out hub")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the hub server (default)
    Serve {
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve {
        config: None,
        host: None,
        port: None,
    }) {
        Commands::Serve { config, host, port } => {
            // The configured subscriber is not known yet; log loading at the default level
            let mut config =
                tracing::subscriber::with_default(bootstrap_subscriber(), || match config {
                    Some(path) => Config::load_with_env(&path),
                    None => Ok(Config::load_default()),
                })?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run(config).await
        }
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing config to {:?}", path))?;
                    println!("Wrote default config to {:?}", path);
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    init_tracing(&config.logging);

    tracing::info!("Starting Huddle v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        max_connections = config.hub.max_connections,
        inbound_capacity = config.hub.inbound_capacity,
        write_timeout_ms = config.hub.write_timeout_ms,
        "Hub configuration"
    );

    let (hub, dispatcher) = Hub::start(config.hub.clone());
    let state = AppState::new(hub, config.server.clone());

    serve(state).await?;

    // Upgraded sockets may still hold inbound senders
    dispatcher.abort();

    tracing::info!("Huddle stopped");
    Ok(())
}

fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("huddle={}", LoggingConfig::default().level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("huddle={},tower_http=info", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
