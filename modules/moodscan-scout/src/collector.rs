use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use discord_client::DiscordError;
use moodscan_common::MoodscanError;
use tracing::{debug, info, warn};

use crate::sources::{SourceGroup, SourceProvider};
use crate::types::ContentBatch;

/// Gathers new human-written text from every allowed source in a time window.
pub struct Collector {
    provider: Arc<dyn SourceProvider>,
    allowed_groups: HashSet<String>,
    per_source_cap: usize,
    source_timeout: Duration,
}

impl Collector {
    pub fn new(
        provider: Arc<dyn SourceProvider>,
        allowed_groups: impl IntoIterator<Item = String>,
        per_source_cap: usize,
        source_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            allowed_groups: allowed_groups.into_iter().collect(),
            per_source_cap,
            source_timeout,
        }
    }

    fn is_allowed(&self, group: &SourceGroup) -> bool {
        self.allowed_groups.is_empty() || self.allowed_groups.contains(&group.id)
    }

    /// Every provider call is bounded; a call that runs out of time is a failure.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        tokio::time::timeout(self.source_timeout, call)
            .await
            .unwrap_or_else(|_| Err(anyhow!("timed out after {:?}", self.source_timeout)))
    }

    /// Collect at most `remaining_quota` items created after `since` and no
    /// later than `until`.
    ///
    /// Sources that fail or time out are logged and skipped. Once the quota is
    /// reached no further sources are read.
    pub async fn collect(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        remaining_quota: u64,
    ) -> ContentBatch {
        let mut batch = ContentBatch::new();
        let quota = usize::try_from(remaining_quota).unwrap_or(usize::MAX);
        if quota == 0 {
            return batch;
        }

        let groups = match self.bounded(self.provider.groups()).await {
            Ok(groups) => groups,
            Err(e) => {
                report_unavailable("groups", &e);
                return batch;
            }
        };

        let mut sources_read = 0u32;
        let mut sources_failed = 0u32;

        'groups: for group in groups {
            if !self.is_allowed(&group) {
                debug!(group_id = group.id.as_str(), "Skipping group outside allow-list");
                continue;
            }

            let sources = match self.bounded(self.provider.sources(&group)).await {
                Ok(sources) => sources,
                Err(e) => {
                    report_unavailable(&group.id, &e);
                    sources_failed += 1;
                    continue;
                }
            };

            for source in sources {
                if batch.len() >= quota {
                    break 'groups;
                }

                let fetch = self
                    .provider
                    .fetch_since(&source, since, until, self.per_source_cap);
                let messages = match self.bounded(fetch).await {
                    Ok(messages) => messages,
                    Err(e) => {
                        report_unavailable(&source.id, &e);
                        sources_failed += 1;
                        continue;
                    }
                };
                sources_read += 1;

                for message in messages.into_iter().take(self.per_source_cap) {
                    if batch.len() >= quota {
                        break 'groups;
                    }
                    if message.author_is_human {
                        batch.push(&message.text);
                    }
                }
            }
        }

        info!(
            items = batch.len(),
            sources_read,
            sources_failed,
            remaining_quota,
            "Collection complete"
        );
        batch
    }
}

fn report_unavailable(source_id: &str, err: &anyhow::Error) {
    let reason = match err.downcast_ref::<DiscordError>() {
        Some(d) if d.is_access_denied() => format!("missing access: {d}"),
        _ => format!("{err:#}"),
    };
    let unavailable = MoodscanError::SourceUnavailable {
        source_id: source_id.to_string(),
        reason,
    };
    warn!(error = %unavailable, "Skipping unavailable source");
}
