// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Prometheus metrics for `hookbench run`.

use hookbench_core::HarnessStats;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

lazy_static! {
    pub static ref PHASE_DURATION: HistogramVec = register_histogram_vec!(
        "hookbench_phase_duration_seconds",
        "Wall time of one workload phase",
        &["strategy", "phase"],
        vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    )
    .expect("phase duration histogram registers once");
    pub static ref PHASE_CALLS: IntCounterVec = register_int_counter_vec!(
        "hookbench_phase_calls_total",
        "Target calls made by workload phases",
        &["strategy", "phase"]
    )
    .expect("phase call counter registers once");
    pub static ref PROBE_EVENTS: IntGaugeVec = register_int_gauge_vec!(
        "hookbench_probe_events",
        "Probe callback counts at the last snapshot",
        &["strategy", "event"]
    )
    .expect("probe event gauge registers once");
    pub static ref CACHE_EVENTS: IntGaugeVec = register_int_gauge_vec!(
        "hookbench_workload_cache",
        "Workload engine cache counters at the last snapshot",
        &["strategy", "kind"]
    )
    .expect("cache gauge registers once");
}

/// Record one completed workload phase.
pub fn observe_phase(strategy: &str, phase: &str, calls: u64, seconds: f64) {
    PHASE_DURATION
        .with_label_values(&[strategy, phase])
        .observe(seconds);
    PHASE_CALLS
        .with_label_values(&[strategy, phase])
        .inc_by(calls);
}

/// Publish a harness snapshot as gauges.
pub fn publish_stats(stats: &HarnessStats) {
    let strategy = stats.strategy.as_str();
    let probes = &stats.probes;
    for (event, value) in [
        ("enter", probes.enters),
        ("leave", probes.leaves),
        ("rewrite", probes.rewrites),
        ("workload", probes.workload_runs),
    ] {
        PROBE_EVENTS
            .with_label_values(&[strategy, event])
            .set(value as i64);
    }

    let workload = &stats.workload;
    for (kind, value) in [
        ("hits", workload.cache.hits),
        ("misses", workload.cache.misses),
        ("size", workload.cache_size as u64),
    ] {
        CACHE_EVENTS
            .with_label_values(&[strategy, kind])
            .set(value as i64);
    }
}

/// Start the metrics server in a background task.
pub fn start_metrics_server(port: u16) {
    // Force initialization of metrics
    lazy_static::initialize(&PHASE_DURATION);
    lazy_static::initialize(&PHASE_CALLS);
    lazy_static::initialize(&PROBE_EVENTS);
    lazy_static::initialize(&CACHE_EVENTS);

    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", port);
        match TcpListener::bind(&addr).await {
            Ok(listener) => {
                tracing::info!("Metrics server starting on {}", addr);
                loop {
                    if let Ok((mut socket, _)) = listener.accept().await {
                        tokio::spawn(async move {
                            let body = metrics_handler();
                            let response = format!(
                                "HTTP/1.0 200 OK\r\nConnection: close\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\r\n{}",
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.flush().await;
                        });
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to bind metrics server: {}", e);
            }
        }
    });
}

fn metrics_handler() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| String::from("Encoding error"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_phase_exported() {
        observe_phase("both", "hot", 10, 0.002);
        assert_eq!(
            PHASE_CALLS.with_label_values(&["both", "hot"]).get(),
            10
        );
        assert!(metrics_handler().contains("hookbench_phase_duration_seconds"));
    }
}
