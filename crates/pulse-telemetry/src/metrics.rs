//! Prometheus metrics for the heartbeat engine.
//!
//! Covers:
//! - Job attempts, failures, and timeouts per job name
//! - Job run duration distribution
//! - Market status transitions and the open-market gauge
//! - Quote ingestion and bar lifecycle counters
//! - Gateway write/publish traffic
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration
//! failure means duplicate metric names, a fatal configuration error
//! that should crash at startup rather than fail silently. These panics
//! only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge, CounterVec, HistogramVec,
    IntGauge, TextEncoder,
};

/// Total job run attempts.
pub static JOB_RUNS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pulse_job_runs_total",
        "Total job run attempts",
        &["job", "outcome"]
    )
    .unwrap()
});

/// Job run duration in milliseconds.
pub static JOB_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pulse_job_duration_ms",
        "Job run duration in milliseconds",
        &["job"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Total market status transitions written.
pub static STATUS_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pulse_status_transitions_total",
        "Total market status transitions written to the gateway",
        &["exchange", "status"]
    )
    .unwrap()
});

/// Number of markets currently open.
pub static MARKETS_OPEN: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pulse_markets_open", "Number of markets currently open").unwrap()
});

/// Total quotes ingested.
pub static QUOTES_INGESTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pulse_quotes_ingested_total",
        "Total quotes ingested from the feed",
        &["symbol"]
    )
    .unwrap()
});

/// Total bars closed.
pub static BARS_CLOSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pulse_bars_closed_total",
        "Total bars closed and written",
        &["symbol"]
    )
    .unwrap()
});

/// Total gateway writes by key prefix.
pub static GATEWAY_WRITES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pulse_gateway_writes_total",
        "Total gateway cache writes",
        &["prefix"]
    )
    .unwrap()
});

/// Total gateway publishes by channel.
pub static GATEWAY_PUBLISHES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pulse_gateway_publishes_total",
        "Total gateway publishes",
        &["channel"]
    )
    .unwrap()
});

/// Metrics facade with typed record helpers.
pub struct Metrics;

impl Metrics {
    pub fn job_succeeded(job: &str) {
        JOB_RUNS_TOTAL.with_label_values(&[job, "ok"]).inc();
    }

    pub fn job_failed(job: &str) {
        JOB_RUNS_TOTAL.with_label_values(&[job, "error"]).inc();
    }

    pub fn job_timed_out(job: &str) {
        JOB_RUNS_TOTAL.with_label_values(&[job, "timeout"]).inc();
    }

    pub fn job_duration(job: &str, millis: f64) {
        JOB_DURATION_MS.with_label_values(&[job]).observe(millis);
    }

    pub fn status_transition(exchange: &str, status: &str) {
        STATUS_TRANSITIONS_TOTAL
            .with_label_values(&[exchange, status])
            .inc();
    }

    pub fn markets_open(count: i64) {
        MARKETS_OPEN.set(count);
    }

    pub fn quote_ingested(symbol: &str) {
        QUOTES_INGESTED_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn bar_closed(symbol: &str) {
        BARS_CLOSED_TOTAL.with_label_values(&[symbol]).inc();
    }

    pub fn gateway_write(prefix: &str) {
        GATEWAY_WRITES_TOTAL.with_label_values(&[prefix]).inc();
    }

    pub fn gateway_publish(channel: &str) {
        GATEWAY_PUBLISHES_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Render all registered metrics in Prometheus text format.
    ///
    /// The daemon has no HTTP surface; embedders scrape through this.
    pub fn export() -> String {
        let encoder = TextEncoder::new();
        let families = prometheus::gather();
        encoder.encode_to_string(&families).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_counters_record() {
        Metrics::job_succeeded("test_job");
        Metrics::job_failed("test_job");
        Metrics::job_timed_out("test_job");
        let ok = JOB_RUNS_TOTAL.with_label_values(&["test_job", "ok"]).get();
        assert!(ok >= 1.0);
    }

    #[test]
    fn test_export_contains_metric_names() {
        Metrics::job_succeeded("export_job");
        let text = Metrics::export();
        assert!(text.contains("pulse_job_runs_total"));
    }
}
