use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings of the rainbow colour cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Delay between two colour commands.
    pub interval_ms: u64,
    /// Colour wheel positions advanced per command (1..=254).
    pub step: u8,
    /// Mirror every commanded colour on the local indicator.
    pub mirror_on_indicator: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig {
            interval_ms: 1000,
            step: 1,
            mirror_on_indicator: true,
        }
    }
}

impl CycleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
