use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::backend::ElectionBackend;
use crate::error::Result;

/// Single-node mode: this participant is always the leader.
///
/// Useful for development and for deployments that want the scheduler
/// without a redundant fleet.
pub struct StaticElection {
    self_id: String,
}

impl StaticElection {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
        }
    }
}

#[async_trait]
impl ElectionBackend for StaticElection {
    async fn bootstrap(&mut self) -> Result<String> {
        info!(leader = %self.self_id, "static election — always leader");
        Ok(self.self_id.clone())
    }

    async fn run(self: Box<Self>, notifications: mpsc::Sender<String>) {
        if notifications.send(self.self_id.clone()).await.is_err() {
            return;
        }
        // Leadership never changes; park until shutdown closes the channel.
        notifications.closed().await;
    }
}
