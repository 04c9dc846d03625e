//! Error types for wait operations

use std::time::Duration;
use thiserror::Error;

/// Boxed error raised by a caller-supplied condition
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Wait errors
#[derive(Debug, Error)]
pub enum WaitError {
    /// The condition never held within the time budget
    #[error("Timed out waiting for {description} after {elapsed:?} (timeout {timeout:?})")]
    Timeout {
        /// What was being waited for
        description: String,
        /// Configured time budget
        timeout: Duration,
        /// Time actually spent waiting
        elapsed: Duration,
    },

    /// Fewer events than required appeared within the time budget
    #[error(
        "Timed out waiting for {expected} '{event_type}' event(s) on stream '{stream}' \
         after {elapsed:?} (timeout {timeout:?}): observed {observed} of {expected}"
    )]
    CountTimeout {
        /// Stream that was read
        stream: String,
        /// Event type being counted
        event_type: String,
        /// Count the caller asked for
        expected: usize,
        /// Count seen on the last read
        observed: usize,
        /// Configured time budget
        timeout: Duration,
        /// Time actually spent waiting
        elapsed: Duration,
    },

    /// The wait was aborted through its cancellation token
    #[error("Wait for {description} cancelled after {elapsed:?}")]
    Cancelled {
        /// What was being waited for
        description: String,
        /// Time spent waiting before cancellation
        elapsed: Duration,
    },

    /// Timeout or interval is unusable
    #[error("Invalid wait configuration for {description}: {reason}")]
    InvalidConfig {
        /// What was being waited for
        description: String,
        /// Why the configuration was rejected
        reason: String,
    },

    /// The condition itself failed; never retried
    #[error("Condition for {description} failed: {source}")]
    Condition {
        /// What was being waited for
        description: String,
        /// Error raised by the condition
        #[source]
        source: BoxError,
    },
}

impl WaitError {
    /// Whether the wait ran out of time (plain or count-based)
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::CountTimeout { .. })
    }

    /// Whether the wait was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Time spent waiting, when the wait got far enough to measure it
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Timeout { elapsed, .. }
            | Self::CountTimeout { elapsed, .. }
            | Self::Cancelled { elapsed, .. } => Some(*elapsed),
            Self::InvalidConfig { .. } | Self::Condition { .. } => None,
        }
    }
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, WaitError>;
