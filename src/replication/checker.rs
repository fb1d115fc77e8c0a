// src/replication/checker.rs
use crate::content::{latest_content_id, ContentRecord, ExtractError};
use crate::metrics::MetricsCollector;
use crate::notify::{Notify, Priority};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ReplicationError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Content listing {url} responded {status}")]
    SourceStatus { url: String, status: StatusCode },

    #[error("Unexpected content listing: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationOutcome {
    Replicated { id: String, target_url: String },
    Missing { id: String, target_url: String, status: StatusCode },
    Failed { error: String },
}

impl ReplicationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ReplicationOutcome::Replicated { .. })
    }
}

/// Verifies that the newest published item on the source is served downstream.
pub struct ReplicationChecker {
    client: Client,
    notifier: Arc<dyn Notify>,
    source_url: String,
    target_base: String,
    metrics: Option<Arc<MetricsCollector>>,
}

impl ReplicationChecker {
    pub fn new(
        client: Client,
        notifier: Arc<dyn Notify>,
        source_url: String,
        target_base: String,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            client,
            notifier,
            source_url,
            target_base,
            metrics,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Downstream URL for a content id.
    pub fn target_url(&self, id: &str) -> String {
        format!("{}{}", self.target_base, id)
    }

    pub async fn check(&self) -> ReplicationOutcome {
        let outcome = match self.verify().await {
            Ok((id, target_url, status)) if status.is_success() => {
                info!("Content {} is replicated to {}", id, target_url);
                self.notifier
                    .notify_default(&format!(
                        "Content {} from {} is replicated to {}",
                        id, self.source_url, target_url
                    ))
                    .await;
                ReplicationOutcome::Replicated { id, target_url }
            }
            Ok((id, target_url, status)) => {
                warn!("Content {} missing at {} ({})", id, target_url, status);
                self.notifier
                    .notify(
                        &format!(
                            "Recent page {} from {} is NOT found at {} (HTTP {})",
                            id, self.source_url, target_url, status
                        ),
                        Priority::High,
                    )
                    .await;
                ReplicationOutcome::Missing {
                    id,
                    target_url,
                    status,
                }
            }
            Err(e) => {
                error!("ERROR during replication check: {}", e);
                self.notifier.notify(&e.to_string(), Priority::High).await;
                ReplicationOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.update_replication(outcome.is_ok());
        }

        outcome
    }

    async fn verify(&self) -> Result<(String, String, StatusCode), ReplicationError> {
        let id = self.fetch_latest_id().await?;
        let target_url = self.target_url(&id);

        let status = self.client.get(&target_url).send().await?.status();
        Ok((id, target_url, status))
    }

    /// Pull the listing straight from the source system and pick the newest published id.
    async fn fetch_latest_id(&self) -> Result<String, ReplicationError> {
        let response = self.client.get(&self.source_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplicationError::SourceStatus {
                url: self.source_url.clone(),
                status,
            });
        }

        let body = response.bytes().await?;
        let records: Vec<ContentRecord> = serde_json::from_slice(&body)?;
        Ok(latest_content_id(&records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;

    const LISTING: &str = r#"[
        {"status":[{"value":"true"}],"created":"100","uuid":"a"},
        {"status":[{"value":true}],"created":"200","nid":[{"value":"42"}]},
        {"status":[{"value":false}],"created":"300","nid":[{"value":"99"}]}
    ]"#;

    fn checker(server: &mockito::ServerGuard, notifier: Arc<RecordingNotifier>) -> ReplicationChecker {
        ReplicationChecker::new(
            Client::new(),
            notifier,
            format!("{}/rest/content?page=0", server.url()),
            format!("{}/node/", server.url()),
            None,
        )
    }

    async fn serve_listing(server: &mut mockito::ServerGuard, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/rest/content")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "0".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_replicated_content_notifies_default_priority() {
        let mut server = mockito::Server::new_async().await;
        let _listing = serve_listing(&mut server, LISTING).await;
        let page = server
            .mock("GET", "/node/42")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let checker = checker(&server, notifier.clone());
        let outcome = checker.check().await;

        page.assert_async().await;
        let target_url = checker.target_url("42");
        assert_eq!(
            outcome,
            ReplicationOutcome::Replicated {
                id: "42".to_string(),
                target_url: target_url.clone(),
            }
        );

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Priority::Low);
        assert!(sent[0].0.contains(checker.source_url()));
        assert!(sent[0].0.contains(&target_url));
    }

    #[tokio::test]
    async fn test_missing_page_notifies_high() {
        let mut server = mockito::Server::new_async().await;
        let _listing = serve_listing(&mut server, LISTING).await;
        let _page = server
            .mock("GET", "/node/42")
            .with_status(404)
            .create_async()
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let checker = checker(&server, notifier.clone());
        let outcome = checker.check().await;

        assert!(matches!(
            outcome,
            ReplicationOutcome::Missing { status, .. } if status == StatusCode::NOT_FOUND
        ));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        let (message, priority) = &sent[0];
        assert_eq!(*priority, Priority::High);
        assert!(message.contains("42"));
        assert!(message.contains(checker.source_url()));
        assert!(message.contains(&checker.target_url("42")));
    }

    #[tokio::test]
    async fn test_malformed_listing_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _listing = serve_listing(&mut server, r#"{"message":"Access denied"}"#).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let outcome = checker(&server, notifier.clone()).check().await;

        assert!(!outcome.is_ok());
        assert!(matches!(outcome, ReplicationOutcome::Failed { .. }));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Priority::High);
        assert!(sent[0].0.starts_with("Unexpected content listing"));
    }

    #[tokio::test]
    async fn test_no_published_content_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _listing = serve_listing(
            &mut server,
            r#"[{"status":[{"value":"false"}],"created":"1","nid":[{"value":1}]}]"#,
        )
        .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let outcome = checker(&server, notifier.clone()).check().await;

        assert_eq!(
            outcome,
            ReplicationOutcome::Failed {
                error: "No published content found".to_string()
            }
        );
        assert_eq!(
            notifier.sent(),
            vec![("No published content found".to_string(), Priority::High)]
        );
    }

    #[tokio::test]
    async fn test_source_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _listing = server
            .mock("GET", "/rest/content")
            .match_query(mockito::Matcher::Any)
            .with_status(502)
            .create_async()
            .await;
        let page = server
            .mock("GET", mockito::Matcher::Regex("^/node/".to_string()))
            .expect(0)
            .create_async()
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let outcome = checker(&server, notifier.clone()).check().await;

        page.assert_async().await;
        assert!(matches!(outcome, ReplicationOutcome::Failed { .. }));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.contains("502"));
    }

    #[tokio::test]
    async fn test_unreachable_source_is_reported() {
        let notifier = Arc::new(RecordingNotifier::default());
        let checker = ReplicationChecker::new(
            Client::new(),
            notifier.clone(),
            "http://127.0.0.1:1/rest/content?page=0".to_string(),
            "http://127.0.0.1:1/node/".to_string(),
            None,
        );

        let outcome = checker.check().await;

        assert!(matches!(
            outcome,
            ReplicationOutcome::Failed { ref error } if error.starts_with("Request failed")
        ));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Priority::High);
        assert!(sent[0].0.starts_with("Request failed"));
    }

    #[tokio::test]
    async fn test_unreachable_downstream_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let listing = serve_listing(&mut server, LISTING).await;

        let notifier = Arc::new(RecordingNotifier::default());
        let checker = ReplicationChecker::new(
            Client::new(),
            notifier.clone(),
            format!("{}/rest/content?page=0", server.url()),
            "http://127.0.0.1:1/node/".to_string(),
            None,
        );

        let outcome = checker.check().await;

        listing.assert_async().await;
        assert!(matches!(outcome, ReplicationOutcome::Failed { .. }));
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Priority::High);
        assert!(sent[0].0.starts_with("Request failed"));
    }

    #[tokio::test]
    async fn test_unpublished_record_with_bad_timestamp_does_not_fail_check() {
        let mut server = mockito::Server::new_async().await;
        let _listing = serve_listing(
            &mut server,
            r#"[
                {"status":[{"value":false}],"created":null,"nid":[{"value":"1"}]},
                {"status":[{"value":true}],"created":"200","nid":[{"value":"42"}]}
            ]"#,
        )
        .await;
        let _page = server
            .mock("GET", "/node/42")
            .with_status(200)
            .create_async()
            .await;

        let notifier = Arc::new(RecordingNotifier::default());
        let outcome = checker(&server, notifier.clone()).check().await;

        assert!(outcome.is_ok());
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Priority::Low);
    }
}
