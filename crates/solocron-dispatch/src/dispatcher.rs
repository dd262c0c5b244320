use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::breaker::BreakerRegistry;
use crate::error::DispatchError;
use crate::metrics::DispatchMetrics;
use solocron_scheduler::{JobRunner, ScheduleEntry};

/// Terminal execution boundary for fired jobs.
///
/// Runs the job's action through its breaker, records one metric
/// observation, and logs the outcome. Failures are swallowed here so a bad
/// external target never reaches the timer loop or other jobs.
pub struct Dispatcher {
    breakers: Arc<BreakerRegistry>,
    metrics: Arc<DispatchMetrics>,
}

impl Dispatcher {
    pub fn new(breakers: Arc<BreakerRegistry>, metrics: Arc<DispatchMetrics>) -> Self {
        Self { breakers, metrics }
    }
}

#[async_trait]
impl JobRunner for Dispatcher {
    async fn run_job(&self, entry: &ScheduleEntry) {
        let begin = Instant::now();
        let action = Arc::clone(&entry.action);
        let result = self
            .breakers
            .execute(&entry.id, || async move { action.invoke().await })
            .await;
        let elapsed = begin.elapsed();

        self.metrics.observe(&entry.id, result.is_ok(), elapsed);
        match result {
            Ok(()) => info!(job = %entry.id, ?elapsed, "job fired"),
            Err(DispatchError::CircuitOpen { .. }) => {
                warn!(job = %entry.id, "fire rejected — circuit open")
            }
            Err(err) => warn!(job = %entry.id, error = %err, "fire failed"),
        }
    }
}
