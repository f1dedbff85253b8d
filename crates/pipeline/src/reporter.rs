//! Metrics reporter
//!
//! Logs pipeline, source and publisher counters periodically and once more
//! when stopped.
//!
//! # Example Output (human)
//!
//! ```text
//! pipeline: read=1200 published=1180 rejected=20 invalid=0 defaulted=3 bytes=178340 retries=0 failures=0 reconnects=0 dropped=0
//! source: connections=1 lines=1200 oversized=0 bytes=181200 errors=0
//! publisher: published=1180 failed=0 bytes=178340
//! ```

use std::sync::Arc;

use flightfeed_config::{MetricsConfig, MetricsFormat};
use flightfeed_sinks::{Publisher, PublisherMetricsSnapshot};
use flightfeed_sources::{SourceMetrics, SourceMetricsSnapshot};
use serde::Serialize;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::{PipelineMetrics, PipelineMetricsSnapshot};

/// Collected counters at one point in time
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsReport {
    pub pipeline: PipelineMetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetricsSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<PublisherMetricsSnapshot>,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    config: MetricsConfig,
    pipeline: Arc<PipelineMetrics>,
    source: Option<Arc<SourceMetrics>>,
    publisher: Option<Arc<dyn Publisher>>,
}

impl MetricsReporter {
    /// Create a reporter for pipeline metrics
    pub fn new(config: MetricsConfig, pipeline: Arc<PipelineMetrics>) -> Self {
        Self {
            config,
            pipeline,
            source: None,
            publisher: None,
        }
    }

    /// Also report source metrics
    #[must_use]
    pub fn with_source(mut self, metrics: Arc<SourceMetrics>) -> Self {
        self.source = Some(metrics);
        self
    }

    /// Also report publisher metrics
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Run the reporter until cancellation, then report once more
    ///
    /// Spawn this as a tokio task.
    pub async fn run(self, cancel: CancellationToken) {
        if !self.config.enabled {
            debug!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        debug!(
            interval_secs = self.config.interval.as_secs(),
            format = ?self.config.format,
            "metrics reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.report(),
            }
        }

        self.report();
    }

    /// Collect all counters
    pub fn collect(&self) -> MetricsReport {
        MetricsReport {
            pipeline: self.pipeline.snapshot(),
            source: self.source.as_ref().map(|s| s.snapshot()),
            publisher: self.publisher.as_ref().map(|p| p.metrics()),
        }
    }

    /// Log one report
    pub fn report(&self) {
        match self.format(&self.collect()) {
            Ok(output) => {
                for line in output.lines() {
                    info!("{}", line);
                }
            }
            Err(e) => warn!(error = %e, "failed to format metrics"),
        }
    }

    /// Render a report in the configured format
    pub fn format(&self, report: &MetricsReport) -> Result<String, serde_json::Error> {
        match self.config.format {
            MetricsFormat::Human => Ok(format_human(report)),
            MetricsFormat::Json => serde_json::to_string(report),
        }
    }
}

fn format_human(report: &MetricsReport) -> String {
    let p = &report.pipeline;
    let mut out = format!(
        "pipeline: read={} published={} rejected={} invalid={} defaulted={} bytes={} retries={} failures={} reconnects={} dropped={}",
        p.lines_read,
        p.records_published,
        p.lines_rejected,
        p.lines_invalid,
        p.fields_defaulted,
        p.bytes_published,
        p.publish_retries,
        p.publish_failures,
        p.reconnects,
        p.records_dropped,
    );

    if let Some(s) = &report.source {
        out.push_str(&format!(
            "\nsource: connections={} lines={} oversized={} bytes={} errors={}",
            s.connections_total, s.lines_read, s.lines_oversized, s.bytes_read, s.errors,
        ));
    }

    if let Some(s) = &report.publisher {
        out.push_str(&format!(
            "\npublisher: published={} failed={} bytes={}",
            s.published, s.failed, s.bytes,
        ));
    }

    out
}
