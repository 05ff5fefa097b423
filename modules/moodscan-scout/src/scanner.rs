use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use moodscan_common::{Config, MoodscanError};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::classifier::Classifier;
use crate::collector::Collector;
use crate::quota::QuotaWindow;
use crate::sources::SourceProvider;
use crate::status::{ScanStatus, StatusPublisher};
use crate::types::{RollingStats, TickOutcome};

/// Knobs for the scan loop.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub interval: Duration,
    pub per_source_cap: usize,
    pub daily_limit: u64,
    /// Group ids to scan. Empty means every group.
    pub allowed_groups: Vec<String>,
    /// Ceiling on each provider call during collection.
    pub source_timeout: Duration,
}

impl ScanSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.scan_interval,
            per_source_cap: config.max_messages_per_source,
            daily_limit: config.max_messages_per_day,
            allowed_groups: config.allowed_guild_ids.clone(),
            source_timeout: config.source_timeout,
        }
    }
}

/// Owns the scan cursor, the daily quota and the rolling statistics.
///
/// All mutation goes through `tick`, which takes `&mut self`, so ticks are
/// serialized by construction. Other tasks observe state through `subscribe`.
pub struct Scanner {
    collector: Collector,
    classifier: Arc<dyn Classifier>,
    publisher: Arc<dyn StatusPublisher>,
    interval: Duration,
    interval_delta: chrono::Duration,
    cursor: DateTime<Utc>,
    quota: QuotaWindow,
    stats: RollingStats,
    next_scan_at: Option<DateTime<Utc>>,
    last_outcome: Option<TickOutcome>,
    status_tx: watch::Sender<ScanStatus>,
}

impl Scanner {
    /// Build a scanner whose cursor and quota window start at `now`.
    pub fn new(
        settings: ScanSettings,
        provider: Arc<dyn SourceProvider>,
        classifier: Arc<dyn Classifier>,
        publisher: Arc<dyn StatusPublisher>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let interval_delta = chrono::Duration::from_std(settings.interval)
            .context("scan interval out of range")?;

        let collector = Collector::new(
            provider,
            settings.allowed_groups,
            settings.per_source_cap,
            settings.source_timeout,
        );
        let quota = QuotaWindow::new(settings.daily_limit, now);
        let stats = RollingStats::default();

        let (status_tx, _) = watch::channel(ScanStatus {
            taken_at: now,
            next_scan_at: None,
            stats,
            today: 0,
            daily_limit: settings.daily_limit,
            last_outcome: None,
        });

        Ok(Self {
            collector,
            classifier,
            publisher,
            interval: settings.interval,
            interval_delta,
            cursor: now,
            quota,
            stats,
            next_scan_at: None,
            last_outcome: None,
            status_tx,
        })
    }

    /// Live feed of status snapshots.
    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status_tx.subscribe()
    }

    /// End of the last scanned window.
    pub fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    pub fn quota(&self) -> &QuotaWindow {
        &self.quota
    }

    pub fn stats(&self) -> RollingStats {
        self.stats
    }

    /// Messages classified in the current quota window.
    pub fn today(&self) -> u64 {
        self.quota.consumed()
    }

    pub fn last_outcome(&self) -> Option<TickOutcome> {
        self.last_outcome
    }

    pub fn status(&self, now: DateTime<Utc>) -> ScanStatus {
        ScanStatus {
            taken_at: now,
            next_scan_at: self.next_scan_at,
            stats: self.stats,
            today: self.quota.consumed(),
            daily_limit: self.quota.daily_limit(),
            last_outcome: self.last_outcome,
        }
    }

    /// Send the current snapshot to the watch feed and the publisher.
    pub async fn publish_status(&self, now: DateTime<Utc>) {
        let status = self.status(now);
        self.status_tx.send_replace(status.clone());
        if let Err(e) = self.publisher.publish(&status).await {
            warn!(error = %e, "Failed to publish status");
        }
    }

    /// One scan-decide-collect-classify-merge cycle evaluated at `now`.
    ///
    /// Collects the window `(cursor, now]`. Never fails; whatever happens,
    /// the cursor ends at `now`.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        self.quota.roll(now);

        let outcome = if self.quota.is_exhausted() {
            info!(
                today = self.quota.consumed(),
                limit = self.quota.daily_limit(),
                "Daily quota reached, skipping scan"
            );
            TickOutcome::QuotaExhausted
        } else {
            let batch = self
                .collector
                .collect(self.cursor, now, self.quota.remaining())
                .await;

            if batch.is_empty() {
                info!(since = %self.cursor, "No new messages");
                TickOutcome::NoContent
            } else {
                let messages = batch.len() as u64;
                match self.classifier.classify(&batch).await {
                    Ok(result) => {
                        self.stats.merge(messages, &result);
                        self.quota.consume(messages);
                        TickOutcome::Classified { messages, result }
                    }
                    Err(e) => {
                        let err = MoodscanError::from(e);
                        error!(error = %err, messages, "Classification failed, window skipped");
                        TickOutcome::ClassificationFailed
                    }
                }
            }
        };

        self.cursor = now;
        self.last_outcome = Some(outcome);
        outcome
    }

    /// Run a single tick immediately and publish the result.
    pub async fn run_once(&mut self) -> TickOutcome {
        self.next_scan_at = None;
        let outcome = self.tick(Utc::now()).await;
        info!(%outcome, stats = %self.stats, "Single scan complete");
        self.quota.log_status();
        self.publish_status(Utc::now()).await;
        outcome
    }

    /// Scan every interval until `shutdown` resolves.
    ///
    /// Shutdown is only observed while waiting; an in-flight tick completes.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            interval_secs = self.interval.as_secs(),
            daily_limit = self.quota.daily_limit(),
            "Scanner started"
        );

        loop {
            let now = Utc::now();
            self.next_scan_at = Some(now + self.interval_delta);
            self.publish_status(now).await;

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scanner");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            let outcome = self.tick(Utc::now()).await;
            info!(%outcome, stats = %self.stats, today = self.today(), "Tick complete");
        }

        self.quota.log_status();
    }
}
