//! Per-call wait configuration

use crate::error::{Result, WaitError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between condition checks when nothing else is configured
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(10);

/// Describes a single wait: what it is for and how long it may take
///
/// Built per call and dropped when the call returns.
#[derive(Debug, Clone)]
pub struct WaitSpec {
    description: String,
    timeout: Duration,
    interval: Duration,
    cancel: Option<CancellationToken>,
}

impl WaitSpec {
    /// Create a spec with the default polling interval
    pub fn new(description: impl Into<String>, timeout: Duration) -> Self {
        Self {
            description: description.into(),
            timeout,
            interval: DEFAULT_INTERVAL,
            cancel: None,
        }
    }

    /// Override the delay between checks
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Allow the wait to be aborted early through `token`
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Human-readable name of what is awaited
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Time budget for the whole wait
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay between checks
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancellation token, if one was attached
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Reject zero timeouts and zero intervals
    ///
    /// # Errors
    /// Returns [`WaitError::InvalidConfig`] naming the offending value
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(self.invalid("timeout must be greater than zero"));
        }
        if self.interval.is_zero() {
            return Err(self.invalid("poll interval must be greater than zero"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> WaitError {
        WaitError::InvalidConfig {
            description: self.description.clone(),
            reason: reason.into(),
        }
    }
}
