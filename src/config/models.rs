// src/config/models.rs
use crate::notify::Priority;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Every entry is heartbeat-checked on each run.
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,

    #[serde(default)]
    pub replication: ReplicationConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Exit with a failure code when any check failed.
    #[serde(default)]
    pub strict_exit: bool,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub url: Option<Url>,
    #[serde(default)]
    pub default_priority: Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub url: Url,
    /// Appended verbatim to `url` to form the content URL.
    #[serde(default)]
    pub content_path: String,
}

impl EndpointConfig {
    pub fn content_url(&self) -> String {
        format!("{}{}", self.url, self.content_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_target")]
    pub target: String,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            target: default_target(),
        }
    }
}

fn default_source() -> String {
    "cms".to_string()
}

fn default_target() -> String {
    "frontend".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("replication-monitor/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus textfile written after each run.
    pub textfile: Option<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        for key in [&self.replication.source, &self.replication.target] {
            if !self.endpoints.contains_key(key) {
                bail!("Replication endpoint '{}' is not configured under endpoints", key);
            }
        }

        if self.http.timeout_secs == Some(0) {
            bail!("http.timeout_secs must be greater than zero");
        }

        if self.notify.url.is_none() {
            tracing::warn!("No notification URL configured, alerts will only be logged");
        }

        Ok(())
    }

    /// Content URL of an endpoint: its base URL with the content path appended.
    pub fn content_url(&self, key: &str) -> Option<String> {
        self.endpoints.get(key).map(EndpointConfig::content_url)
    }

    /// Listing URL on the source system.
    pub fn source_url(&self) -> Option<String> {
        self.content_url(&self.replication.source)
    }

    /// Prefix the latest content id is appended to on the downstream system.
    pub fn target_base(&self) -> Option<String> {
        self.content_url(&self.replication.target)
    }
}
