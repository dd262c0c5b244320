use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Classified failure of a job's external call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    /// Transport-level failure — the target was never reached or the
    /// connection broke mid-request.
    #[error("Network error: {0}")]
    Network(String),

    /// The target answered outside the 2xx range.
    #[error("Bad response status: {0}")]
    BadStatus(u16),
}

/// The side effect a job performs when it fires.
#[async_trait]
pub trait JobAction: Send + Sync {
    async fn invoke(&self) -> Result<(), ActionError>;
}

/// One registered periodic job. Immutable after registration.
#[derive(Clone)]
pub struct ScheduleEntry {
    /// Stable, unique job name — breaker and metric key.
    pub id: String,
    /// Firing cadence. Must be strictly positive.
    pub interval: Duration,
    pub action: Arc<dyn JobAction>,
}

impl ScheduleEntry {
    pub fn new(id: impl Into<String>, interval: Duration, action: Arc<dyn JobAction>) -> Self {
        Self {
            id: id.into(),
            interval,
            action,
        }
    }
}

impl fmt::Debug for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleEntry")
            .field("id", &self.id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Seam between the timer loop and job execution.
///
/// The production implementation is the dispatcher (breaker + metrics);
/// tests substitute a counting fake. Must never return an error — a failing
/// job is terminal at this boundary.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run_job(&self, entry: &ScheduleEntry);
}
