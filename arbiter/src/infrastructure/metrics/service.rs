// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Service
//!
//! Prometheus counters, gauges, and histograms describing the scheduling
//! daemon: cycles run and failed, cycle latency, candidates evaluated,
//! reservations rejected during selection, and the application
//! population. The registry is private to the service; consumers get
//! the encoded text exposition.

use std::sync::Arc;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

use resource_arbiter_domain::ArbiterError;

const NAMESPACE: &str = "resource_arbiter";

/// Prometheus metrics for the arbiter daemon.
#[derive(Clone)]
pub struct MetricsService {
    registry: Arc<Registry>,

    cycles_total: IntCounter,
    cycle_failures_total: IntCounter,
    cycle_timeouts_total: IntCounter,
    cycle_duration_seconds: Histogram,

    candidates_evaluated_total: IntCounter,
    reservations_rejected_total: IntCounter,

    applications_registered: IntGauge,
    applications_blocked: IntGauge,
}

impl MetricsService {
    pub fn new() -> Result<Self, ArbiterError> {
        let registry = Registry::new();

        let cycles_total = IntCounter::with_opts(
            Opts::new("cycles_total", "Scheduling cycles committed").namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("cycles_total: {}", e)))?;

        let cycle_failures_total = IntCounter::with_opts(
            Opts::new("cycle_failures_total", "Scheduling cycles aborted").namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("cycle_failures_total: {}", e)))?;

        let cycle_timeouts_total = IntCounter::with_opts(
            Opts::new("cycle_timeouts_total", "Scheduling cycles over budget").namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("cycle_timeouts_total: {}", e)))?;

        let cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("cycle_duration_seconds", "Wall time of one scheduling cycle")
                .namespace(NAMESPACE)
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("cycle_duration_seconds: {}", e)))?;

        let candidates_evaluated_total = IntCounter::with_opts(
            Opts::new(
                "candidates_evaluated_total",
                "Scheduling candidates scored across all cycles",
            )
            .namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("candidates_evaluated_total: {}", e)))?;

        let reservations_rejected_total = IntCounter::with_opts(
            Opts::new(
                "reservations_rejected_total",
                "Candidate reservations rejected during greedy selection",
            )
            .namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("reservations_rejected_total: {}", e)))?;

        let applications_registered = IntGauge::with_opts(
            Opts::new("applications_registered", "Applications currently registered")
                .namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("applications_registered: {}", e)))?;

        let applications_blocked = IntGauge::with_opts(
            Opts::new("applications_blocked", "Applications blocked by the last cycle")
                .namespace(NAMESPACE),
        )
        .map_err(|e| ArbiterError::metrics_error(format!("applications_blocked: {}", e)))?;

        for collector in [
            Box::new(cycles_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(cycle_failures_total.clone()),
            Box::new(cycle_timeouts_total.clone()),
            Box::new(cycle_duration_seconds.clone()),
            Box::new(candidates_evaluated_total.clone()),
            Box::new(reservations_rejected_total.clone()),
            Box::new(applications_registered.clone()),
            Box::new(applications_blocked.clone()),
        ] {
            registry
                .register(collector)
                .map_err(|e| ArbiterError::metrics_error(e.to_string()))?;
        }

        Ok(Self {
            registry: Arc::new(registry),
            cycles_total,
            cycle_failures_total,
            cycle_timeouts_total,
            cycle_duration_seconds,
            candidates_evaluated_total,
            reservations_rejected_total,
            applications_registered,
            applications_blocked,
        })
    }

    pub fn record_cycle(&self, duration: std::time::Duration) {
        self.cycles_total.inc();
        self.cycle_duration_seconds.observe(duration.as_secs_f64());
    }

    pub fn record_cycle_failure(&self) {
        self.cycle_failures_total.inc();
    }

    pub fn record_cycle_timeout(&self) {
        self.cycle_timeouts_total.inc();
    }

    pub fn add_candidates_evaluated(&self, count: u64) {
        self.candidates_evaluated_total.inc_by(count);
    }

    pub fn record_reservation_rejected(&self) {
        self.reservations_rejected_total.inc();
    }

    pub fn set_applications_registered(&self, count: i64) {
        self.applications_registered.set(count);
    }

    pub fn set_applications_blocked(&self, count: i64) {
        self.applications_blocked.set(count);
    }

    /// Text exposition of all registered metrics.
    pub fn encode(&self) -> Result<String, ArbiterError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ArbiterError::metrics_error(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| ArbiterError::metrics_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_encode() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_cycle(std::time::Duration::from_millis(3));
        metrics.add_candidates_evaluated(12);
        metrics.set_applications_registered(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("resource_arbiter_cycles_total 1"));
        assert!(text.contains("resource_arbiter_candidates_evaluated_total 12"));
        assert!(text.contains("resource_arbiter_applications_registered 2"));
    }

    #[test]
    fn test_failure_counters_independent() {
        let metrics = MetricsService::new().unwrap();
        metrics.record_cycle_failure();
        metrics.record_cycle_timeout();
        let text = metrics.encode().unwrap();
        assert!(text.contains("resource_arbiter_cycle_failures_total 1"));
        assert!(text.contains("resource_arbiter_cycle_timeouts_total 1"));
    }
}
