//! Logging setup and the fan-out report.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::FeedConfig;

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// JSON lines in production, compact text elsewhere.
pub fn init_tracing(config: &FeedConfig) -> Result<(), InitError> {
    let filter =
        EnvFilter::try_new(config.log_level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.is_production() {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .try_init()
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
    }
}

/// Per-call counters for one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutReport {
    /// Keys as supplied, duplicates included.
    pub requested: usize,
    /// Keys actually looked up.
    pub unique: usize,
    pub found: usize,
    pub not_found: usize,
}

impl FanOutReport {
    pub fn duplicates(&self) -> usize {
        self.requested - self.unique
    }
}
