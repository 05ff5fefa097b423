use async_trait::async_trait;
use tracing::info;

use super::publisher::StatusPublisher;
use super::ScanStatus;

/// Writes each snapshot to the log. Always enabled.
pub struct LogPublisher;

#[async_trait]
impl StatusPublisher for LogPublisher {
    async fn publish(&self, status: &ScanStatus) -> anyhow::Result<()> {
        info!(
            next_scan_minutes = status.minutes_to_next_scan(),
            total_messages = status.stats.total_messages,
            positive = status.stats.positive,
            neutral = status.stats.neutral,
            negative = status.stats.negative,
            today = status.today,
            daily_limit = status.daily_limit,
            "{status}"
        );
        Ok(())
    }
}
