use async_trait::async_trait;

use super::ScanStatus;

/// Pluggable sink for status snapshots.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, status: &ScanStatus) -> anyhow::Result<()>;
}
