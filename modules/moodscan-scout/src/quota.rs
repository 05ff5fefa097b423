use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

/// Length of one quota window.
pub fn window_length() -> Duration {
    Duration::hours(24)
}

/// Tracks messages classified against a daily ceiling.
///
/// `consumed` is the "today" count shown in status; it never exceeds the limit.
#[derive(Debug, Clone)]
pub struct QuotaWindow {
    window_start: DateTime<Utc>,
    consumed: u64,
    daily_limit: u64,
}

impl QuotaWindow {
    pub fn new(daily_limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            window_start: now,
            consumed: 0,
            daily_limit,
        }
    }

    /// Start a fresh window if the current one is 24h old. Returns true on reset.
    pub fn roll(&mut self, now: DateTime<Utc>) -> bool {
        if now - self.window_start < window_length() {
            return false;
        }
        info!(
            previous_start = %self.window_start,
            consumed = self.consumed,
            limit = self.daily_limit,
            "Quota window reset"
        );
        self.window_start = now;
        self.consumed = 0;
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.consumed >= self.daily_limit
    }

    /// Messages still allowed in this window.
    pub fn remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.consumed)
    }

    /// Record classified messages. Anything beyond the limit is dropped from the count.
    pub fn consume(&mut self, messages: u64) {
        let allowed = messages.min(self.remaining());
        if allowed < messages {
            warn!(
                requested = messages,
                allowed,
                limit = self.daily_limit,
                "Batch exceeded remaining quota"
            );
        }
        self.consumed += allowed;
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    /// Log quota status.
    pub fn log_status(&self) {
        info!(
            consumed = self.consumed,
            remaining = self.remaining(),
            limit = self.daily_limit,
            window_start = %self.window_start,
            "Quota status"
        );
    }
}
