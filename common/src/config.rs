use std::time::Duration;

use crate::error::ValidationError;

/// Narrowest and widest subnet a sweep accepts.
pub const MIN_PREFIX: u8 = 16;
pub const MAX_PREFIX: u8 = 32;

pub const DEFAULT_PREFIX: u8 = 24;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(50);

pub struct Config {
    /// Suppresses headers and decorations.
    ///
    /// `1` keeps results, `2` only prints the summary.
    pub quiet: u8,
    pub scan: ScanConfig,
}

/// Parameters of a single discovery sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Interface to scan on. `None` picks the best LAN candidate.
    pub interface: Option<String>,
    /// Width of the swept subnet around the local address.
    pub prefix: u8,
    /// How long the listener blocks on a receive before re-checking its stop flag.
    pub read_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interface: None,
            prefix: DEFAULT_PREFIX,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ScanConfig {
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    pub fn with_prefix(mut self, prefix: u8) -> Result<Self, ValidationError> {
        self.prefix = validate_prefix(prefix)?;
        Ok(self)
    }
}

pub fn validate_prefix(prefix: u8) -> Result<u8, ValidationError> {
    if (MIN_PREFIX..=MAX_PREFIX).contains(&prefix) {
        Ok(prefix)
    } else {
        Err(ValidationError::Prefix(prefix))
    }
}
