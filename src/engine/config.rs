//! Engine configuration options.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Log every committed event at info level.
    pub verbose: bool,
    /// Clock value the engine starts at. the pool's funding checkpoint begins here.
    pub start_time: Timestamp,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            verbose: false,
            start_time: Timestamp::from_secs(0),
        }
    }
}
