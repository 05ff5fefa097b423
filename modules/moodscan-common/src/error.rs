use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MoodscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source unavailable ({source_id}): {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),
}

/// Any failure to turn a batch into sentiment counts. One tick, one outcome.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed classifier response: {0}")]
    Malformed(String),
}
