//! `solocron-dispatch` — fault-isolated execution of fired jobs.
//!
//! Each fire flows through a per-job [`breaker::BreakerRegistry`] cell so a
//! failing target fails fast instead of accumulating retries, then lands in
//! the metrics sink. The [`Dispatcher`] is the terminal error boundary: a
//! failing external target is logged and counted, never propagated back to
//! the timer loop.

pub mod breaker;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod webhook;

pub use breaker::{BreakerEvent, BreakerRegistry, BreakerSettings, BreakerSnapshot, BreakerState};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use metrics::DispatchMetrics;
pub use webhook::WebhookAction;
