use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::backend::ElectionBackend;
use crate::error::{ElectionError, Result};
use solocron_core::config::ElectionConfig;

/// Leader record served by the elector sidecar.
#[derive(Debug, Deserialize)]
struct LeaderPayload {
    name: String,
}

/// Polls a leader-elector sidecar over HTTP.
///
/// The sidecar runs the actual election against the coordination service and
/// serves the current leader as `{"name":"..."}`. Polling at half the lease
/// TTL guarantees a change is observed within one TTL; names are forwarded
/// on change only, so the channel carries one message per transition.
pub struct SidecarElection {
    endpoint: String,
    poll_interval: Duration,
    client: reqwest::Client,
    last: Option<String>,
}

impl SidecarElection {
    pub fn new(config: &ElectionConfig) -> Self {
        let poll_interval = Duration::from_secs((config.ttl_secs / 2).max(1));
        info!(
            election = %config.name,
            namespace = %config.namespace,
            endpoint = %config.sidecar_url,
            ?poll_interval,
            "sidecar election configured"
        );
        Self {
            endpoint: config.sidecar_url.clone(),
            poll_interval,
            client: reqwest::Client::new(),
            last: None,
        }
    }

    async fn fetch_leader(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ElectionError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ElectionError::BadResponse(format!(
                "status {}",
                response.status()
            )));
        }

        let payload: LeaderPayload = response
            .json()
            .await
            .map_err(|e| ElectionError::BadResponse(e.to_string()))?;
        Ok(payload.name)
    }
}

#[async_trait]
impl ElectionBackend for SidecarElection {
    async fn bootstrap(&mut self) -> Result<String> {
        let leader = self.fetch_leader().await?;
        info!(%leader, "election bootstrap complete");
        self.last = Some(leader.clone());
        Ok(leader)
    }

    async fn run(mut self: Box<Self>, notifications: mpsc::Sender<String>) {
        // Deliver the bootstrap leader as the first notification.
        if let Some(ref leader) = self.last {
            if notifications.send(leader.clone()).await.is_err() {
                return;
            }
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.fetch_leader().await {
                Ok(leader) => {
                    if self.last.as_deref() != Some(leader.as_str()) {
                        self.last = Some(leader.clone());
                        if notifications.send(leader).await.is_err() {
                            return;
                        }
                    }
                }
                // Transient outage after bootstrap: keep the last known
                // leader until the sidecar answers again.
                Err(e) => warn!(error = %e, "leader poll failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ttl_secs: u64) -> ElectionConfig {
        ElectionConfig {
            ttl_secs,
            ..ElectionConfig::default()
        }
    }

    #[test]
    fn polls_at_half_the_ttl() {
        let backend = SidecarElection::new(&config(10));
        assert_eq!(backend.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn poll_interval_never_drops_below_a_second() {
        let backend = SidecarElection::new(&config(1));
        assert_eq!(backend.poll_interval, Duration::from_secs(1));
    }
}
