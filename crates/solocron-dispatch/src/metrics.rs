use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

/// Histogram buckets for fire latency, in seconds.
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Fire counters and latency histograms, keyed by job name and outcome.
///
/// Lives on its own `Registry` so the exposition handler serves exactly this
/// subsystem's metrics.
pub struct DispatchMetrics {
    fired_total: IntCounterVec,
    fire_duration: HistogramVec,
    registry: Registry,
}

impl DispatchMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let fired_total = IntCounterVec::new(
            Opts::new("solocron_fires_total", "Total job fires by outcome"),
            &["job", "outcome"],
        )?;
        let fire_duration = HistogramVec::new(
            HistogramOpts::new(
                "solocron_fire_duration_seconds",
                "Duration of job fires including the external call",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["job", "outcome"],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(fired_total.clone()))?;
        registry.register(Box::new(fire_duration.clone()))?;

        Ok(Self {
            fired_total,
            fire_duration,
            registry,
        })
    }

    /// Record exactly one observation for a completed fire.
    pub fn observe(&self, job: &str, success: bool, elapsed: Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.fired_total.with_label_values(&[job, outcome]).inc();
        self.fire_duration
            .with_label_values(&[job, outcome])
            .observe(elapsed.as_secs_f64());
    }

    /// Registry for the /metrics exposition handler.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
