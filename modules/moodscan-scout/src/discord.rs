use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use discord_client::{DiscordClient, Message};
use tracing::debug;

use crate::sources::{Source, SourceGroup, SourceMessage, SourceProvider};

impl From<Message> for SourceMessage {
    fn from(message: Message) -> Self {
        Self {
            author_is_human: message.is_from_human(),
            text: message.content,
        }
    }
}

#[async_trait]
impl SourceProvider for DiscordClient {
    async fn groups(&self) -> Result<Vec<SourceGroup>> {
        let guilds = self.current_user_guilds().await?;
        Ok(guilds
            .into_iter()
            .map(|g| SourceGroup {
                id: g.id,
                name: g.name,
            })
            .collect())
    }

    async fn sources(&self, group: &SourceGroup) -> Result<Vec<Source>> {
        let channels = self.guild_channels(&group.id).await?;
        let total = channels.len();

        let sources: Vec<Source> = channels
            .into_iter()
            .filter(|c| c.is_text())
            .map(|c| Source {
                id: c.id,
                group_id: group.id.clone(),
                name: c.name.unwrap_or_default(),
            })
            .collect();

        debug!(
            guild_id = group.id.as_str(),
            channels = total,
            text_channels = sources.len(),
            "Listed guild channels"
        );
        Ok(sources)
    }

    async fn fetch_since(
        &self,
        source: &Source,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SourceMessage>> {
        let messages = self.messages_after(&source.id, since, until, limit).await?;
        Ok(messages.into_iter().map(SourceMessage::from).collect())
    }
}
