use std::sync::Arc;

use async_trait::async_trait;
use discord_client::{DiscordClient, WebhookPayload};

use super::publisher::StatusPublisher;
use super::ScanStatus;

const WEBHOOK_USERNAME: &str = "moodscan";

/// Posts each snapshot to a Discord webhook.
pub struct WebhookPublisher {
    client: Arc<DiscordClient>,
    webhook_url: String,
}

impl WebhookPublisher {
    pub fn new(client: Arc<DiscordClient>, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
        }
    }
}

#[async_trait]
impl StatusPublisher for WebhookPublisher {
    async fn publish(&self, status: &ScanStatus) -> anyhow::Result<()> {
        let payload = WebhookPayload {
            content: status.to_string(),
            username: Some(WEBHOOK_USERNAME.to_string()),
        };
        self.client
            .execute_webhook(&self.webhook_url, &payload)
            .await?;
        Ok(())
    }
}
