//! Metrics for the ingestion pipeline.
//!
//! Names live in one enum so recording sites never spell them by hand.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Once, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Environment variable holding the optional Prometheus listen address
pub const METRICS_ADDR_ENV: &str = "AAT_METRICS_ADDR";

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Files
    FilesProcessed,
    FilesSkipped,

    // Records
    RecordsAccepted,
    RecordsSkipped,
    UnrecognizedMonths,

    // Extraction service calls
    ExtractionAttempts,
    ExtractionRetries,
    ExtractionFailures,
    ExtractionDuration,

    // Dataset mutations
    FilesDeleted,
    DatasetWipes,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::FilesProcessed => "aat_ingest_files_processed_total",
            MetricName::FilesSkipped => "aat_ingest_files_skipped_total",
            MetricName::RecordsAccepted => "aat_ingest_records_accepted_total",
            MetricName::RecordsSkipped => "aat_ingest_records_skipped_total",
            MetricName::UnrecognizedMonths => "aat_ingest_unrecognized_months_total",
            MetricName::ExtractionAttempts => "aat_extraction_attempts_total",
            MetricName::ExtractionRetries => "aat_extraction_retries_total",
            MetricName::ExtractionFailures => "aat_extraction_failures_total",
            MetricName::ExtractionDuration => "aat_extraction_duration_seconds",
            MetricName::FilesDeleted => "aat_dataset_files_deleted_total",
            MetricName::DatasetWipes => "aat_dataset_wipes_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            FilesProcessed,
            FilesSkipped,
            RecordsAccepted,
            RecordsSkipped,
            UnrecognizedMonths,
            ExtractionAttempts,
            ExtractionRetries,
            ExtractionFailures,
            ExtractionDuration,
            FilesDeleted,
            DatasetWipes,
        ]
        .into_iter()
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the Prometheus recorder. Idempotent.
///
/// Starts an HTTP exporter only when `AAT_METRICS_ADDR` holds a valid socket
/// address; otherwise the recorder is kept for in-process rendering.
pub fn init_metrics() {
    INIT.call_once(|| {
        let builder = PrometheusBuilder::new();
        let addr = std::env::var(METRICS_ADDR_ENV).ok();

        let result = match addr.as_deref().map(str::parse::<SocketAddr>) {
            Some(Ok(addr)) => builder.with_http_listener(addr).install().map(|()| {
                info!("Prometheus exporter listening on http://{}/metrics", addr);
            }),
            Some(Err(e)) => {
                warn!("Invalid {} value: {}", METRICS_ADDR_ENV, e);
                builder.install_recorder().map(|handle| {
                    let _ = HANDLE.set(handle);
                })
            }
            None => builder.install_recorder().map(|handle| {
                let _ = HANDLE.set(handle);
            }),
        };

        if let Err(e) = result {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    });
}

/// Current metrics in Prometheus text format, when rendering in-process
pub fn render_metrics() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Recording helpers for ingestion and dataset maintenance
pub struct IngestMetrics;

impl IngestMetrics {
    pub fn file_processed() {
        ::metrics::counter!(MetricName::FilesProcessed.as_str()).increment(1);
    }

    pub fn file_skipped() {
        ::metrics::counter!(MetricName::FilesSkipped.as_str()).increment(1);
    }

    pub fn records_merged(accepted: usize, skipped: usize, unrecognized_months: usize) {
        ::metrics::counter!(MetricName::RecordsAccepted.as_str()).increment(accepted as u64);
        ::metrics::counter!(MetricName::RecordsSkipped.as_str()).increment(skipped as u64);
        if unrecognized_months > 0 {
            ::metrics::counter!(MetricName::UnrecognizedMonths.as_str())
                .increment(unrecognized_months as u64);
        }
    }

    pub fn extraction_attempt() {
        ::metrics::counter!(MetricName::ExtractionAttempts.as_str()).increment(1);
    }

    pub fn extraction_retry() {
        ::metrics::counter!(MetricName::ExtractionRetries.as_str()).increment(1);
    }

    pub fn extraction_failure() {
        ::metrics::counter!(MetricName::ExtractionFailures.as_str()).increment(1);
    }

    pub fn extraction_duration(seconds: f64) {
        ::metrics::histogram!(MetricName::ExtractionDuration.as_str()).record(seconds);
    }

    pub fn file_deleted() {
        ::metrics::counter!(MetricName::FilesDeleted.as_str()).increment(1);
    }

    pub fn dataset_wiped() {
        ::metrics::counter!(MetricName::DatasetWipes.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let names: Vec<&str> = MetricName::all_metrics().map(|m| m.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.iter().all(|n| n.starts_with("aat_")));
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        IngestMetrics::file_processed();
        IngestMetrics::records_merged(3, 1, 0);
        IngestMetrics::extraction_duration(0.25);
    }
}
