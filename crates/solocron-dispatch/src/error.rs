use thiserror::Error;

use solocron_scheduler::ActionError;

/// Outcome classification for one dispatched fire.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The breaker rejected the call without touching the network.
    #[error("Circuit open for {breaker}")]
    CircuitOpen { breaker: String },

    /// The external call itself failed.
    #[error(transparent)]
    Action(#[from] ActionError),
}
