//! Scrape pipeline metrics.
//!
//! Counters and histograms follow the `scrape_{name}` convention. A
//! Prometheus recorder is installed once per process and rendered in-process
//! by the `/metrics` route.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if HANDLE.set(handle).is_err() {
                warn!("metrics handle already set");
            }
            ScrapeMetrics::register_metrics();
            info!("Prometheus recorder installed");
        }
        Err(e) => {
            warn!("Failed to install Prometheus recorder: {}", e);
        }
    });
}

/// Prometheus text exposition of the current snapshot, if the recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

pub struct ScrapeMetrics;

impl ScrapeMetrics {
    pub fn record_fetch_attempt() {
        ::metrics::counter!("scrape_fetch_attempts_total").increment(1);
    }

    pub fn record_fetch_failure(error_type: &'static str) {
        ::metrics::counter!("scrape_fetch_failures_total", "error_type" => error_type)
            .increment(1);
    }

    pub fn record_fetch_duration(duration_secs: f64) {
        ::metrics::histogram!("scrape_fetch_duration_seconds").record(duration_secs);
    }

    pub fn record_retry() {
        ::metrics::counter!("scrape_retries_total").increment(1);
    }

    pub fn record_rows_extracted(table: &str, rows: usize) {
        ::metrics::counter!("scrape_rows_extracted_total", "table" => table.to_string())
            .increment(rows as u64);
    }

    pub fn record_rows_persisted(table: &str, rows: usize) {
        ::metrics::counter!("scrape_rows_persisted_total", "table" => table.to_string())
            .increment(rows as u64);
    }

    pub fn record_table_not_found() {
        ::metrics::counter!("scrape_tables_not_found_total").increment(1);
    }

    /// Pre-register so the series show up before first use.
    fn register_metrics() {
        let _ = ::metrics::counter!("scrape_fetch_attempts_total");
        let _ = ::metrics::counter!("scrape_retries_total");
        let _ = ::metrics::counter!("scrape_tables_not_found_total");
        let _ = ::metrics::histogram!("scrape_fetch_duration_seconds");
    }
}
