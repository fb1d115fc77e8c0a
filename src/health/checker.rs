// src/health/checker.rs
use crate::metrics::{MetricsCollector, Timer};
use crate::notify::{Notify, Priority};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

/// Liveness check against endpoint base URLs.
pub struct HeartbeatChecker {
    client: Client,
    notifier: Arc<dyn Notify>,
    metrics: Option<Arc<MetricsCollector>>,
}

#[derive(Debug, Clone)]
pub struct HeartbeatResult {
    pub endpoint: String,
    pub url: Url,
    pub healthy: bool,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

impl HeartbeatChecker {
    pub fn new(
        client: Client,
        notifier: Arc<dyn Notify>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            client,
            notifier,
            metrics,
        }
    }

    /// GET the endpoint's base URL, alerting on a non-success status or transport failure.
    pub async fn check(&self, key: &str, url: &Url) -> HeartbeatResult {
        let timer = Timer::new();
        let result = self.client.get(url.as_str()).send().await;
        let response_time_ms = timer.elapsed_ms();

        let error = match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!("Endpoint {} is up ({}, {}ms)", key, status, response_time_ms);
                    None
                } else {
                    warn!("Endpoint {} at {} responded {}", key, url, status);
                    self.notifier
                        .notify(
                            &format!("Looks like the {} site at {} is down (HTTP {})", key, url, status),
                            Priority::Critical,
                        )
                        .await;
                    Some(format!("HTTP {}", status))
                }
            }
            Err(e) => {
                error!("ERROR trying to heartbeat {}: {}", key, e);
                self.notifier.notify(&e.to_string(), Priority::High).await;
                Some(e.to_string())
            }
        };

        let healthy = error.is_none();
        if let Some(metrics) = &self.metrics {
            metrics.update_endpoint_health(key, healthy, response_time_ms);
        }

        HeartbeatResult {
            endpoint: key.to_string(),
            url: url.clone(),
            healthy,
            response_time_ms,
            error,
        }
    }
}
