//! Subscriber notification through an HTTP mail relay
//!
//! One JSON request per publish is POSTed to the relay, which fans the
//! message out to the listed recipients. Pending subscriptions live in the
//! [`JsonArtifactStore`].

use crate::core::traits::{Artifact, NotificationDispatcher};
use crate::store::json_store::JsonArtifactStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

const DEFAULT_SENDER: &str = "doc-publisher@localhost";

/// Body of one relay request
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MailRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub artifact_id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// [`NotificationDispatcher`] posting to a mail relay endpoint
pub struct MailRelayDispatcher {
    client: reqwest::Client,
    endpoint: String,
    sender: String,
    store: Arc<JsonArtifactStore>,
}

impl MailRelayDispatcher {
    pub fn new(
        endpoint: impl Into<String>,
        sender: Option<String>,
        store: Arc<JsonArtifactStore>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            sender: sender.unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            store,
        }
    }

    pub fn build_request(&self, artifact: &Artifact, recipients: &[String]) -> MailRequest {
        MailRequest {
            from: self.sender.clone(),
            to: recipients.to_vec(),
            subject: format!("{} has been published", artifact.name),
            artifact_id: artifact.id.0,
            name: artifact.name.clone(),
            uploaded_at: artifact.uploaded_at,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for MailRelayDispatcher {
    async fn subscriptions_for(&self, artifact: &Artifact) -> anyhow::Result<Vec<String>> {
        Ok(self.store.subscriptions_for(artifact.id).await?)
    }

    async fn send(&self, artifact: &Artifact, recipients: &[String]) -> anyhow::Result<()> {
        let request = self.build_request(artifact, recipients);
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Mail relay {} rejected the notification (HTTP {})",
                self.endpoint,
                response.status()
            );
        }

        tracing::debug!(recipients = recipients.len(), "notification accepted by relay");
        Ok(())
    }

    async fn clear_subscriptions(&self, artifact: &Artifact) -> anyhow::Result<()> {
        let removed = self.store.clear_subscriptions(artifact.id).await?;
        tracing::debug!(removed, "subscriptions cleared");
        Ok(())
    }
}
