//! Default wait settings parsed from configuration documents

use crate::error::WaitError;
use crate::spec::WaitSpec;
use config::{File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

/// Default timeout and polling interval for a test suite
///
/// Individual waits still pass their own timeout; this only supplies the
/// fallback values. Binaries embed it as a section of their own layered
/// configuration.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Time budget in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay between checks in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_interval_ms() -> u64 {
    10
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl WaitConfig {
    /// Parse configuration from a TOML document
    ///
    /// # Errors
    /// Returns an error if the document is malformed or a value is zero
    pub fn from_toml(document: &str) -> anyhow::Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero timeouts and zero intervals
    ///
    /// # Errors
    /// Returns [`WaitError::InvalidConfig`] naming the offending field
    pub fn validate(&self) -> Result<(), WaitError> {
        self.spec("configured defaults").validate()
    }

    /// Configured time budget
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured delay between checks
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Build a [`WaitSpec`] carrying these defaults
    pub fn spec(&self, description: impl Into<String>) -> WaitSpec {
        WaitSpec::new(description, self.timeout()).with_interval(self.interval())
    }
}
