use chrono::NaiveDate;
use thiserror::Error;

/// Top-level error type for Stride.
#[derive(Debug, Error)]
pub enum StrideError {
    /// Transient transport failure (network, timeout, 5xx). Retryable.
    #[error("channel error: {0}")]
    Channel(String),

    /// The messaging API rejected the request (4xx). Not retryable.
    #[error("channel rejected request: {0}")]
    ChannelRejected(String),

    /// Error from the extraction/completion collaborator.
    #[error("nlp error: {0}")]
    Nlp(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Durable storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A habit already has a checkin for the given day.
    #[error("habit {habit_id} already checked in on {day}")]
    DuplicateCheckin { habit_id: i64, day: NaiveDate },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StrideError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StrideError::Channel(_))
    }
}
