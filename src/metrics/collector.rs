// src/metrics/collector.rs
use crate::notify::Priority;
use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }

    /// Write the exposition text for node_exporter's textfile collector.
    ///
    /// The file is replaced atomically so a scrape never sees a partial write.
    pub async fn write_textfile(&self, path: &Path) -> Result<()> {
        let buffer = self.gather()?;
        let tmp = path.with_extension("prom.tmp");

        tokio::fs::write(&tmp, buffer)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to move metrics into {}", path.display()))?;

        Ok(())
    }
}

pub struct MetricsCollector {
    // Heartbeat metrics
    pub endpoint_up: IntGaugeVec,
    pub endpoint_response_time_ms: IntGaugeVec,

    // Replication metrics
    pub replication_ok: IntGauge,

    // Notification metrics
    pub notifications_total: IntCounterVec,

    // Run metrics
    pub last_run_timestamp_seconds: IntGauge,
    pub failed_checks: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let endpoint_up = IntGaugeVec::new(
            Opts::new(
                "monitor_endpoint_up",
                "Endpoint heartbeat status (1=up, 0=down)",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(endpoint_up.clone()))?;

        let endpoint_response_time_ms = IntGaugeVec::new(
            Opts::new(
                "monitor_endpoint_response_time_ms",
                "Heartbeat response time in milliseconds",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(endpoint_response_time_ms.clone()))?;

        let replication_ok = IntGauge::new(
            "monitor_replication_ok",
            "Latest content found downstream (1=yes, 0=no)",
        )?;
        registry.register(Box::new(replication_ok.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new("monitor_notifications_total", "Notifications attempted"),
            &["priority", "outcome"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        let last_run_timestamp_seconds = IntGauge::new(
            "monitor_last_run_timestamp_seconds",
            "Unix time the last run finished",
        )?;
        registry.register(Box::new(last_run_timestamp_seconds.clone()))?;

        let failed_checks =
            IntGauge::new("monitor_failed_checks", "Failed checks in the last run")?;
        registry.register(Box::new(failed_checks.clone()))?;

        Ok(Self {
            endpoint_up,
            endpoint_response_time_ms,
            replication_ok,
            notifications_total,
            last_run_timestamp_seconds,
            failed_checks,
        })
    }

    pub fn update_endpoint_health(&self, endpoint: &str, healthy: bool, response_time_ms: u64) {
        let value = if healthy { 1 } else { 0 };
        self.endpoint_up.with_label_values(&[endpoint]).set(value);
        self.endpoint_response_time_ms
            .with_label_values(&[endpoint])
            .set(response_time_ms as i64);
    }

    pub fn update_replication(&self, ok: bool) {
        self.replication_ok.set(if ok { 1 } else { 0 });
    }

    pub fn record_notification(&self, priority: Priority, delivered: bool) {
        let outcome = if delivered { "sent" } else { "failed" };
        self.notifications_total
            .with_label_values(&[priority.as_str(), outcome])
            .inc();
    }

    pub fn record_run(&self, finished_at: i64, failed_checks: usize) {
        self.last_run_timestamp_seconds.set(finished_at);
        self.failed_checks.set(failed_checks as i64);
    }
}

// Helper for timing operations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
