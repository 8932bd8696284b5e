//! Roulette settlement API binary

use clap::{Parser, Subcommand};
use roulette_engine::{
    api::{ApiServer, AppState},
    config::{generate_sample_config, ConfigLoader, EngineConfig},
    notifications::SettlementEvent,
};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "roulette-api")]
#[command(about = "American roulette bet settlement service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from the development preset (seeded wheel, debug logs)
    #[arg(long)]
    dev: bool,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Fixed wheel seed for reproducible outcomes
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Write the default configuration to a file
    SampleConfig {
        #[arg(default_value = "roulette.toml")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Commands::SampleConfig { path }) = &cli.command {
        generate_sample_config(path)?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_tracing(&config);

    info!("Starting roulette API v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::from_config(&config));
    tokio::spawn(log_settlements(state.events.subscribe()));

    ApiServer::new(config, state).run().await
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match (&cli.config, cli.dev) {
        (Some(path), _) => ConfigLoader::new().with_path(path).load()?,
        (None, true) => ConfigLoader::new()
            .with_base(EngineConfig::development())
            .load()?,
        (None, false) => ConfigLoader::new().load()?,
    };

    if let Some(host) = &cli.host {
        config.api.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }
    if cli.seed.is_some() {
        config.wheel.seed = cli.seed;
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &EngineConfig) {
    let fallback = format!(
        "roulette_engine={level},roulette_api={level},tower_http=info",
        level = config.monitoring.log_level.as_filter()
    );

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .init();
}

/// Downstream consumer of committed spins
async fn log_settlements(mut events: broadcast::Receiver<SettlementEvent>) {
    loop {
        match events.recv().await {
            Ok(event) if event.is_net_win() => {
                info!(
                    spin_id = %event.spin_id,
                    player = %event.player_id,
                    result = %event.result,
                    total_win = %event.total_win,
                    "Player won"
                );
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Settlement log lagged; skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
