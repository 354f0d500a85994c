use anyhow::{Context, Result};
use clap::Parser;
use instance_healthcheck::cli::commands::{check_config_command, run_command};
use instance_healthcheck::cli::{Cli, Commands};
use instance_healthcheck::config::Config;
use log::{debug, error, info, warn};
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment first so RUST_LOG from .env applies
    match &cli.env_file {
        Some(path) => dotenvy::from_path(path)
            .with_context(|| format!("Failed to load environment file: {:?}", path))?,
        None => {
            dotenvy::dotenv().ok();
        }
    }

    init_logging(cli.log_file.as_deref())?;
    info!("Starting instance-healthcheck {}", env!("CARGO_PKG_VERSION"));

    let result = execute(cli).await;
    if let Err(e) = &result {
        error!("Fatal: {:#}", e);
    }
    result
}

async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    debug!(
        "Loaded configuration with {} endpoints",
        config.ods_api.endpoints.len()
    );

    match cli.command {
        Commands::Run(args) => {
            let cancel = CancellationToken::new();
            let signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after in-flight work");
                    signal.cancel();
                }
            });

            run_command(args, &config, cancel).await?;
        }
        Commands::CheckConfig(args) => {
            check_config_command(args, &config, cli.config.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        // Truncate on each run
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {:?}", path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
