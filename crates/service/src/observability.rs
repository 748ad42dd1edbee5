use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "imove_admin_requests_total",
        "Total authenticated API requests issued"
    )
    .expect("register requests_total")
});

pub static REQUEST_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "imove_admin_request_failures_total",
        "Total API requests that failed (network or non-2xx)"
    )
    .expect("register request_failures_total")
});

pub static REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "imove_admin_request_duration_seconds",
        "API request duration in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register request_duration")
});

pub static STALE_RESPONSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "imove_admin_stale_responses_total",
        "Responses discarded because a newer query superseded them"
    )
    .expect("register stale_responses_total")
});

pub static SESSION_TEARDOWNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "imove_admin_session_teardowns_total",
        "Sessions torn down (logout, expiry, corrupt store, authorization failure)"
    )
    .expect("register session_teardowns_total")
});

/// Text exposition of every registered metric.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# metrics encode error: {e}\n");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        STALE_RESPONSES_TOTAL.inc();
        let text = encode_metrics();
        assert!(text.contains("imove_admin_stale_responses_total"));
    }
}
