use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01).
pub const DISCORD_EPOCH_MS: i64 = 1_420_070_400_000;

/// Channel type codes that carry readable text history.
const GUILD_TEXT: u8 = 0;
const GUILD_ANNOUNCEMENT: u8 = 5;

/// Largest snowflake whose embedded timestamp is at or before `at`.
///
/// Passing this as `after=` returns only messages created strictly after `at`.
pub fn last_snowflake_at(at: DateTime<Utc>) -> u64 {
    let ms = (at.timestamp_millis() - DISCORD_EPOCH_MS).max(0) as u64;
    ((ms + 1) << 22) - 1
}

/// A guild the bot user is a member of (partial object from `/users/@me/guilds`).
#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

/// A guild channel (partial).
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl Channel {
    /// Text and announcement channels; voice, category and forum containers have no history.
    pub fn is_text(&self) -> bool {
        matches!(self.kind, GUILD_TEXT | GUILD_ANNOUNCEMENT)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub system: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: Author,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub webhook_id: Option<String>,
}

impl Message {
    pub fn snowflake(&self) -> Option<u64> {
        self.id.parse().ok()
    }

    /// Posted by a person rather than a bot, a webhook, or Discord itself.
    pub fn is_from_human(&self) -> bool {
        !self.author.bot && !self.author.system && self.webhook_id.is_none()
    }
}

/// Body for executing a webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Body of a 429 response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RateLimitBody {
    pub retry_after: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn millis_of(id: u64) -> i64 {
        (id >> 22) as i64 + DISCORD_EPOCH_MS
    }

    #[test]
    fn snowflake_bound_is_the_last_id_of_its_millisecond() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let bound = last_snowflake_at(at);
        assert_eq!(millis_of(bound), at.timestamp_millis());
        // The next id belongs to the following millisecond.
        assert_eq!(millis_of(bound + 1), at.timestamp_millis() + 1);
    }

    #[test]
    fn snowflake_before_discord_epoch_clamps_to_zero_ms() {
        let at = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(last_snowflake_at(at), (1 << 22) - 1);
    }

    #[test]
    fn bound_orders_against_a_known_message_id() {
        // Example id from the Discord API reference, created at 1_462_015_105_796 ms.
        let id: u64 = 175_928_847_299_117_063;
        let created = DateTime::from_timestamp_millis(1_462_015_105_796).unwrap();
        assert!(id <= last_snowflake_at(created));
        assert!(id > last_snowflake_at(created - chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn bots_webhooks_and_system_messages_are_not_human() {
        let raw = serde_json::json!({
            "id": "1",
            "channel_id": "10",
            "author": {"id": "5", "username": "alice"},
            "content": "hi",
            "timestamp": "2024-03-01T12:00:00+00:00"
        });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        assert!(msg.is_from_human());

        let mut bot = raw.clone();
        bot["author"]["bot"] = true.into();
        assert!(!serde_json::from_value::<Message>(bot).unwrap().is_from_human());

        let mut hook = raw.clone();
        hook["webhook_id"] = "77".into();
        assert!(!serde_json::from_value::<Message>(hook).unwrap().is_from_human());

        let mut system = raw;
        system["author"]["system"] = true.into();
        assert!(!serde_json::from_value::<Message>(system).unwrap().is_from_human());
    }

    #[test]
    fn only_text_like_channels_have_history() {
        let channel = |kind: u8| Channel {
            id: "1".into(),
            kind,
            name: None,
        };
        assert!(channel(0).is_text());
        assert!(channel(5).is_text());
        assert!(!channel(2).is_text());
        assert!(!channel(4).is_text());
    }
}
