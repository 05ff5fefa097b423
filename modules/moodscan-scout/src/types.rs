use std::fmt;

use ai_client::truncate_to_char_boundary;
use serde::Deserialize;

/// Longest single item kept in a batch. Matches Discord's message length cap.
pub const MAX_ITEM_BYTES: usize = 2_000;

/// Texts collected in one tick, in collection order.
///
/// Every item is trimmed and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBatch {
    items: Vec<String>,
}

impl ContentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text if it has content after trimming. Returns whether it was added.
    pub fn push(&mut self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let clipped = truncate_to_char_boundary(trimmed, MAX_ITEM_BYTES).trim_end();
        self.items.push(clipped.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

impl<S: AsRef<str>> FromIterator<S> for ContentBatch {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut batch = Self::new();
        for text in iter {
            batch.push(text.as_ref());
        }
        batch
    }
}

/// Sentiment counts returned for a batch. The sum is not checked against the batch size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ClassificationResult {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub neutral: u64,
    #[serde(default)]
    pub negative: u64,
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "positive={} neutral={} negative={}",
            self.positive, self.neutral, self.negative
        )
    }
}

/// Cumulative counts since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollingStats {
    pub total_messages: u64,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl RollingStats {
    pub fn merge(&mut self, messages: u64, result: &ClassificationResult) {
        self.total_messages += messages;
        self.positive += result.positive;
        self.neutral += result.neutral;
        self.negative += result.negative;
    }
}

impl fmt::Display for RollingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total_messages={} positive={} neutral={} negative={}",
            self.total_messages, self.positive, self.neutral, self.negative
        )
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Daily quota was already used up; nothing was collected.
    QuotaExhausted,
    /// Nothing new to classify; the classifier was not called.
    NoContent,
    /// The classifier call failed; the window is skipped.
    ClassificationFailed,
    Classified {
        messages: u64,
        result: ClassificationResult,
    },
}

impl TickOutcome {
    pub fn called_classifier(&self) -> bool {
        matches!(
            self,
            TickOutcome::ClassificationFailed | TickOutcome::Classified { .. }
        )
    }
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExhausted => write!(f, "quota_exhausted"),
            Self::NoContent => write!(f, "no_content"),
            Self::ClassificationFailed => write!(f, "classification_failed"),
            Self::Classified { messages, result } => {
                write!(f, "classified(messages={messages} {result})")
            }
        }
    }
}
