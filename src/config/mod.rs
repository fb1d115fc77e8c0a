// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat, Map};
use std::path::Path;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "REPLICATION_MONITOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "monitor.yaml";

/// Load configuration from a file (YAML or JSON) with `MONITOR_*` environment overrides.
///
/// A missing file is not an error; the environment alone may carry the whole configuration.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = if tokio::fs::try_exists(path).await.unwrap_or(false) {
        tokio::fs::read_to_string(path)
            .await
            .context("Failed to read config file")?
    } else {
        tracing::info!("Config file {} not found, using environment only", path.display());
        String::new()
    };

    let format = match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        _ => FileFormat::Json,
    };

    let config = parse_config(&contents, format)?;
    config.validate()?;
    Ok(config)
}

/// Parse file contents, layering process environment overrides on top.
pub fn parse_config(contents: &str, format: FileFormat) -> Result<Config> {
    parse_config_with_env(contents, format, None)
}

/// Like [`parse_config`], reading `MONITOR_*` overrides from `env` instead of the
/// process environment when given.
pub fn parse_config_with_env(
    contents: &str,
    format: FileFormat,
    env: Option<Map<String, String>>,
) -> Result<Config> {
    let mut builder = config::Config::builder();
    if !contents.trim().is_empty() {
        builder = builder.add_source(File::from_str(contents, format));
    }

    builder
        .add_source(
            Environment::with_prefix("MONITOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("Failed to assemble configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")
}
