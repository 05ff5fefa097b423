pub mod log;
pub mod publisher;
pub mod router;
pub mod webhook;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::types::{RollingStats, TickOutcome};

pub use log::LogPublisher;
pub use publisher::StatusPublisher;
pub use router::StatusRouter;
pub use webhook::WebhookPublisher;

/// Snapshot of the scanner, taken at `taken_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStatus {
    pub taken_at: DateTime<Utc>,
    pub next_scan_at: Option<DateTime<Utc>>,
    pub stats: RollingStats,
    pub today: u64,
    pub daily_limit: u64,
    pub last_outcome: Option<TickOutcome>,
}

impl ScanStatus {
    /// Whole minutes until the next scan, rounded down, never negative.
    pub fn minutes_to_next_scan(&self) -> Option<i64> {
        self.next_scan_at
            .map(|at| (at - self.taken_at).num_minutes().max(0))
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minutes_to_next_scan() {
            Some(m) => write!(f, "⏱ next scan: {m}m")?,
            None => write!(f, "⏱ next scan: ⏳")?,
        }
        write!(
            f,
            " | 📨 {} msgs | 🙂{} 😐{} ☠️{} | today {}/{}",
            self.stats.total_messages,
            self.stats.positive,
            self.stats.neutral,
            self.stats.negative,
            self.today,
            self.daily_limit,
        )
    }
}
