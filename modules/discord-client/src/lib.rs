pub mod error;
pub mod types;

pub use error::{DiscordError, Result};
pub use types::{
    last_snowflake_at, Author, Channel, Guild, Message, WebhookPayload,
};

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use types::RateLimitBody;

const BASE_URL: &str = "https://discord.com/api/v10";

/// Discord caps message history pages at 100.
const MAX_PAGE_SIZE: usize = 100;

/// Discord caps `/users/@me/guilds` pages at 200.
const MAX_GUILD_PAGE: usize = 200;

/// Longest server-requested backoff we are willing to sleep through once.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

pub struct DiscordClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DiscordClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Guilds the bot user belongs to.
    pub async fn current_user_guilds(&self) -> Result<Vec<Guild>> {
        let mut guilds: Vec<Guild> = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("limit", MAX_GUILD_PAGE.to_string())];
            if let Some(ref id) = after {
                query.push(("after", id.clone()));
            }

            let page: Vec<Guild> = self.get_json("/users/@me/guilds", &query).await?;
            let full_page = page.len() == MAX_GUILD_PAGE;
            after = page.last().map(|g| g.id.clone());
            guilds.extend(page);

            if !full_page {
                break;
            }
        }

        tracing::debug!(count = guilds.len(), "Fetched guilds");
        Ok(guilds)
    }

    /// All channels of a guild, regardless of type.
    pub async fn guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>> {
        self.get_json(&format!("/guilds/{guild_id}/channels"), &[])
            .await
    }

    /// Up to `limit` messages created strictly after `since` and no later than
    /// `until`, oldest first.
    pub async fn messages_after(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = Vec::new();
        let mut cursor = last_snowflake_at(since);

        'pages: while messages.len() < limit {
            let page_size = (limit - messages.len()).min(MAX_PAGE_SIZE);
            let query = [
                ("after", cursor.to_string()),
                ("limit", page_size.to_string()),
            ];

            let mut page: Vec<Message> = self
                .get_json(&format!("/channels/{channel_id}/messages"), &query)
                .await?;
            let page_len = page.len();

            // Discord returns pages newest-first; walk forward in time.
            page.sort_by_key(|m| m.snowflake().unwrap_or(0));
            let newest = page.iter().filter_map(Message::snowflake).max();

            for message in page {
                if message.timestamp > until {
                    break 'pages;
                }
                messages.push(message);
            }

            match newest {
                Some(newest) if newest > cursor => cursor = newest,
                _ => break,
            }
            if page_len < page_size {
                break;
            }
        }

        messages.truncate(limit);
        tracing::debug!(channel_id, count = messages.len(), "Fetched message history");
        Ok(messages)
    }

    /// Post a message through a webhook URL. Webhooks carry their own credentials.
    pub async fn execute_webhook(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<()> {
        let resp = self.client.post(webhook_url).json(payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let request = || {
            self.client
                .get(&url)
                .header("Authorization", format!("Bot {}", self.token))
                .query(query)
        };

        match self.send(request()).await {
            Err(DiscordError::RateLimited { retry_after_secs }) => {
                let wait = match Duration::try_from_secs_f64(retry_after_secs.max(0.0)) {
                    Ok(wait) if wait <= MAX_RETRY_AFTER => wait,
                    _ => return Err(DiscordError::RateLimited { retry_after_secs }),
                };
                tracing::debug!(path, retry_after_secs, "Rate limited, retrying once");
                tokio::time::sleep(wait).await;
                self.send(request()).await
            }
            other => other,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            let retry_after_secs = serde_json::from_str::<RateLimitBody>(&body)
                .map(|b| b.retry_after)
                .unwrap_or(1.0);
            return Err(DiscordError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscordError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
