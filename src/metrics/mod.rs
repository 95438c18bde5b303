// Hover pipeline Prometheus metrics
//
// Provides process-wide counters for the hover pipeline, including:
// - Cache outcomes (hits, misses, evictions)
// - Backend fetches, failures and coalesced joins
// - Presentation outcomes (stale results discarded)
// - Fetch latency histogram

use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounter, TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics registry for the hover pipeline
pub struct HoverMetrics {
    /// Lookups that returned a fresh cache entry
    pub cache_hits: IntCounter,

    /// Lookups with no usable entry (absent or expired)
    pub cache_misses: IntCounter,

    /// Entries pushed out by capacity overflow
    pub cache_evictions: IntCounter,

    /// Network calls actually issued
    pub fetches: IntCounter,

    /// Network calls that ended in a failure outcome
    pub fetch_failures: IntCounter,

    /// Callers that attached to an already in-flight request
    pub coalesced_joins: IntCounter,

    /// Resolutions dropped because the tracked target changed
    pub stale_discards: IntCounter,

    /// Fired hover jobs that were suppressed by the per-key cooldown
    pub cooldown_suppressions: IntCounter,

    /// Backend fetch duration (in seconds)
    pub fetch_duration: Histogram,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<HoverMetrics> = OnceLock::new();

impl HoverMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Subsequent calls return the same instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let cache_ops = register_int_counter_vec!(
                "hoverscan_cache_operations_total",
                "Total number of analysis cache operations by outcome",
                &["outcome"] // hit, miss, eviction
            )
            .expect("Failed to register cache_operations_total metric");

            let backend_ops = register_int_counter_vec!(
                "hoverscan_backend_requests_total",
                "Total number of analysis requests by result",
                &["result"] // fetched, failed, joined
            )
            .expect("Failed to register backend_requests_total metric");

            let presentation = register_int_counter_vec!(
                "hoverscan_presentation_total",
                "Hover presentation decisions by type",
                &["decision"] // stale_discarded, cooldown_suppressed
            )
            .expect("Failed to register presentation_total metric");

            let fetch_duration = register_histogram!(
                "hoverscan_backend_fetch_duration_seconds",
                "Duration of analysis backend calls in seconds",
                vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
            )
            .expect("Failed to register backend_fetch_duration_seconds metric");

            HoverMetrics {
                cache_hits: cache_ops.with_label_values(&["hit"]),
                cache_misses: cache_ops.with_label_values(&["miss"]),
                cache_evictions: cache_ops.with_label_values(&["eviction"]),
                fetches: backend_ops.with_label_values(&["fetched"]),
                fetch_failures: backend_ops.with_label_values(&["failed"]),
                coalesced_joins: backend_ops.with_label_values(&["joined"]),
                stale_discards: presentation.with_label_values(&["stale_discarded"]),
                cooldown_suppressions: presentation.with_label_values(&["cooldown_suppressed"]),
                fetch_duration,
            }
        })
    }

    /// Start timing a backend fetch
    ///
    /// The duration is recorded when the returned timer is dropped.
    pub fn start_fetch_timer(&self) -> FetchTimer {
        FetchTimer {
            histogram: self.fetch_duration.clone(),
            start: std::time::Instant::now(),
        }
    }
}

/// RAII timer for the fetch histogram
pub struct FetchTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl Drop for FetchTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Render every registered metric in the Prometheus text format
pub fn export_text() -> String {
    // Make sure our families exist even if nothing has been recorded yet
    let _ = HoverMetrics::global();

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_returns_same_instance() {
        let a = HoverMetrics::global() as *const HoverMetrics;
        let b = HoverMetrics::global() as *const HoverMetrics;
        assert_eq!(a, b);
    }

    #[test]
    fn test_counters_increment() {
        let metrics = HoverMetrics::global();
        let before = metrics.coalesced_joins.get();
        metrics.coalesced_joins.inc();
        assert!(metrics.coalesced_joins.get() >= before + 1);
    }

    #[test]
    fn test_fetch_timer_records_on_drop() {
        let metrics = HoverMetrics::global();
        let before = metrics.fetch_duration.get_sample_count();
        {
            let _timer = metrics.start_fetch_timer();
        }
        assert!(metrics.fetch_duration.get_sample_count() >= before + 1);
    }

    #[test]
    fn test_export_contains_metric_families() {
        HoverMetrics::global().cache_hits.inc();
        let text = export_text();
        assert!(text.contains("hoverscan_cache_operations_total"));
    }
}
