use async_trait::async_trait;
use serde_json::{json, Value};

use solocron_scheduler::{ActionError, JobAction};

/// Outbound POST callback — the side effect behind every configured job.
///
/// The payload names the firing event and the node that fired it, so targets
/// can tell which fleet member was active.
pub struct WebhookAction {
    event: String,
    url: String,
    node: String,
    client: reqwest::Client,
}

impl WebhookAction {
    pub fn new(
        event: impl Into<String>,
        url: impl Into<String>,
        node: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            event: event.into(),
            url: url.into(),
            node: node.into(),
            client,
        }
    }

    fn payload(&self) -> Value {
        json!({ "event": self.event, "node": self.node })
    }
}

#[async_trait]
impl JobAction for WebhookAction {
    async fn invoke(&self) -> Result<(), ActionError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload())
            .send()
            .await
            .map_err(|e| ActionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::BadStatus(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_names_event_and_node() {
        let action = WebhookAction::new(
            "nightly-report",
            "https://example.com/hook",
            "node-1",
            reqwest::Client::new(),
        );
        assert_eq!(
            action.payload(),
            json!({ "event": "nightly-report", "node": "node-1" })
        );
    }
}
