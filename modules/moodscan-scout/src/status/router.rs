use async_trait::async_trait;
use tracing::warn;

use super::publisher::StatusPublisher;
use super::ScanStatus;

/// Fans a snapshot out to every configured publisher.
///
/// A failing publisher is logged and does not stop the others.
#[derive(Default)]
pub struct StatusRouter {
    publishers: Vec<(&'static str, Box<dyn StatusPublisher>)>,
}

impl StatusRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, publisher: impl StatusPublisher + 'static) -> Self {
        self.publishers.push((name, Box::new(publisher)));
        self
    }
}

#[async_trait]
impl StatusPublisher for StatusRouter {
    async fn publish(&self, status: &ScanStatus) -> anyhow::Result<()> {
        for (name, publisher) in &self.publishers {
            if let Err(e) = publisher.publish(status).await {
                warn!(publisher = *name, error = %e, "Failed to publish status");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::t0;
    use crate::types::RollingStats;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl StatusPublisher for Counting {
        async fn publish(&self, _status: &ScanStatus) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("unreachable webhook");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn failing_publisher_does_not_block_the_rest() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let router = StatusRouter::new()
            .with("broken", Counting { calls: first.clone(), fail: true })
            .with("fine", Counting { calls: second.clone(), fail: false });

        let status = ScanStatus {
            taken_at: t0(),
            next_scan_at: None,
            stats: RollingStats::default(),
            today: 0,
            daily_limit: 10,
            last_outcome: None,
        };

        assert!(router.publish(&status).await.is_ok());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
