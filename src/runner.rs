// src/runner.rs
use crate::config::{Config, HttpConfig};
use crate::health::{HeartbeatChecker, HeartbeatResult};
use crate::metrics::MetricsRegistry;
use crate::notify::{Notifier, Notify};
use crate::replication::{ReplicationChecker, ReplicationOutcome};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shared HTTP client for all checks and notifications.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.as_str());
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to create HTTP client")
}

#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub heartbeats: Vec<HeartbeatResult>,
    pub replication: ReplicationOutcome,
}

impl RunReport {
    /// Number of failed checks, heartbeats and replication together.
    pub fn failures(&self) -> usize {
        let heartbeat_failures = self.heartbeats.iter().filter(|h| !h.healthy).count();
        heartbeat_failures + usize::from(!self.replication.is_ok())
    }

    pub fn is_ok(&self) -> bool {
        self.failures() == 0
    }
}

/// One monitoring pass: every heartbeat plus a single replication check.
pub struct Runner {
    config: Arc<Config>,
    heartbeat: Arc<HeartbeatChecker>,
    replication: ReplicationChecker,
    metrics: Option<MetricsRegistry>,
}

impl Runner {
    pub fn new(config: Config) -> Result<Self> {
        let client = build_client(&config.http)?;

        let metrics = match config.metrics.textfile {
            Some(_) => Some(MetricsRegistry::new()?),
            None => None,
        };
        let collector = metrics.as_ref().map(MetricsRegistry::collector);

        let notifier: Arc<dyn Notify> = Arc::new(Notifier::new(
            client.clone(),
            config.notify.clone(),
            collector,
        ));

        Self::with_notifier(config, client, notifier, metrics)
    }

    /// Build with a caller-supplied alert sink.
    pub fn with_notifier(
        config: Config,
        client: Client,
        notifier: Arc<dyn Notify>,
        metrics: Option<MetricsRegistry>,
    ) -> Result<Self> {
        let collector = metrics.as_ref().map(MetricsRegistry::collector);

        let source_url = config
            .source_url()
            .with_context(|| format!("Unknown replication source '{}'", config.replication.source))?;
        let target_base = config
            .target_base()
            .with_context(|| format!("Unknown replication target '{}'", config.replication.target))?;

        let heartbeat = Arc::new(HeartbeatChecker::new(
            client.clone(),
            notifier.clone(),
            collector.clone(),
        ));
        let replication =
            ReplicationChecker::new(client, notifier, source_url, target_base, collector);

        Ok(Self {
            config: Arc::new(config),
            heartbeat,
            replication,
            metrics,
        })
    }

    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        let started_at = Utc::now();

        info!(
            parent: &span,
            "Checking {} endpoints and replication from {}",
            self.config.endpoints.len(),
            self.replication.source_url()
        );

        let (heartbeats, replication) = tokio::join!(
            self.run_heartbeats().instrument(span.clone()),
            self.replication.check().instrument(span.clone()),
        );

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            heartbeats,
            replication,
        };

        span.in_scope(|| {
            if report.is_ok() {
                info!("Run complete: all checks passed");
            } else {
                warn!("Run complete: {} failed checks", report.failures());
            }
        });

        self.export_metrics(&report).await;
        report
    }

    // Heartbeats run concurrently and are all joined before the run ends,
    // so no pending notification is dropped at exit.
    async fn run_heartbeats(&self) -> Vec<HeartbeatResult> {
        let mut endpoints = Vec::new();
        let mut tasks = Vec::new();

        for (key, endpoint) in &self.config.endpoints {
            let checker = self.heartbeat.clone();
            let key = key.clone();
            let url = endpoint.url.clone();
            endpoints.push((key.clone(), url.clone()));

            let task = tokio::spawn(
                async move { checker.check(&key, &url).await }.in_current_span(),
            );
            tasks.push(task);
        }

        // Wait for all heartbeats to complete
        let results = futures::future::join_all(tasks).await;

        results
            .into_iter()
            .zip(endpoints)
            .map(|(result, (endpoint, url))| match result {
                Ok(check_result) => check_result,
                Err(e) => {
                    error!("Task join error: {}", e);
                    HeartbeatResult {
                        endpoint,
                        url,
                        healthy: false,
                        response_time_ms: 0,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    async fn export_metrics(&self, report: &RunReport) {
        let (Some(registry), Some(path)) = (&self.metrics, &self.config.metrics.textfile) else {
            return;
        };

        registry
            .collector()
            .record_run(report.finished_at.timestamp(), report.failures());

        if let Err(e) = registry.write_textfile(path).await {
            error!("Failed to export metrics: {:#}", e);
        }
    }
}
