use anyhow::Result;
use clap::Parser;
use event_relay::server::server::{self, AppState};
use event_relay::utils::config_loader;
use event_relay::utils::logging;
use event_relay::utils::logging::LogLevel;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "event-relay.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Resolve secrets, build token source and relays
    // -------------------------------

    let state = AppState::from_config(&service_config).await?;

    // -------------------------------
    // 3. Serve /api/submit, /api/chat and metrics
    // -------------------------------

    info!("Service starting...");
    server::start(&service_config.settings, state).await?;

    Ok(())
}
