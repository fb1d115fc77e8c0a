// src/notify/notifier.rs
use super::{Notify, Priority};
use crate::config::NotifyConfig;
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("No notification URL configured")]
    NotConfigured,

    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification endpoint responded {0}")]
    Status(StatusCode),
}

/// Posts plain-text alerts to a push-notification topic.
pub struct Notifier {
    client: Client,
    config: NotifyConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Notifier {
    pub fn new(
        client: Client,
        config: NotifyConfig,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            client,
            config,
            metrics,
        }
    }

    /// Send to an explicit topic URL instead of the configured one.
    pub async fn send_to(&self, topic_url: &Url, message: &str, priority: Priority) {
        let result = self.post(topic_url, message, priority).await;
        self.report(result, priority);
    }

    async fn post(
        &self,
        topic_url: &Url,
        message: &str,
        priority: Priority,
    ) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(topic_url.as_str())
            .header(CONTENT_TYPE, "text/plain")
            .header("Title", priority.title())
            .header("Priority", priority.as_str())
            .body(message.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        Ok(())
    }

    fn report(&self, result: Result<(), NotifyError>, priority: Priority) {
        let delivered = result.is_ok();
        match result {
            Ok(()) => info!("Notification sent ({})", priority),
            Err(e) => error!("Failed to push notification: {}", e),
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_notification(priority, delivered);
        }
    }
}

#[async_trait]
impl Notify for Notifier {
    async fn notify(&self, message: &str, priority: Priority) {
        let result = match &self.config.url {
            Some(url) => self.post(url, message, priority).await,
            None => Err(NotifyError::NotConfigured),
        };
        self.report(result, priority);
    }

    fn default_priority(&self) -> Priority {
        self.config.default_priority
    }
}
