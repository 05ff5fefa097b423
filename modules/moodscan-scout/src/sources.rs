// Source abstraction for the Collector.
//
// A SourceProvider enumerates groups (Discord guilds), the sources inside them
// (text channels), and reads messages newer than a timestamp. DiscordClient is
// the production implementation; MockSourceProvider in `testing` is the
// in-memory one.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A container of sources, e.g. a guild. Allow-listing happens at this level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub id: String,
    pub name: String,
}

/// A single readable message stream, e.g. a text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub group_id: String,
    pub name: String,
}

/// One item as read from a source, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub author_is_human: bool,
    pub text: String,
}

impl SourceMessage {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            author_is_human: true,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            author_is_human: false,
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Every group the provider can see.
    async fn groups(&self) -> Result<Vec<SourceGroup>>;

    /// Readable sources inside a group.
    async fn sources(&self, group: &SourceGroup) -> Result<Vec<Source>>;

    /// At most `limit` items created strictly after `since` and no later
    /// than `until`, oldest first.
    async fn fetch_since(
        &self,
        source: &Source,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SourceMessage>>;
}
