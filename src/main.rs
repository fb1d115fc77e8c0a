// src/main.rs
use anyhow::Result;
use replication_monitor::config::{self, CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH};
use replication_monitor::Runner;
use std::process::ExitCode;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("replication_monitor=info".parse()?)
                .add_directive("reqwest=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path =
        std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;
    let strict_exit = config.strict_exit;

    let runner = Runner::new(config)?;
    let report = runner.run().await;

    if strict_exit && !report.is_ok() {
        warn!("Exiting with failure: {} checks failed", report.failures());
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
