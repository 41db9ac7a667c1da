use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Completion timers armed next to every animation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Watchdog", inline)]
#[serde(default)]
pub struct WatchdogOptions {
    /// Added to the duration for the fallback timer.
    #[schemars(title = "Fallback Buffer (ms)", range(min = 0, max = 1000))]
    pub fallback_buffer_ms: u64,
    /// Added to the duration for the watchdog timer. Should exceed the
    /// fallback buffer.
    #[schemars(title = "Watchdog Buffer (ms)", range(min = 0, max = 5000))]
    pub watchdog_buffer_ms: u64,
}

impl WatchdogOptions {
    /// Fallback buffer as a duration.
    #[must_use]
    pub fn fallback_buffer(&self) -> Duration {
        Duration::from_millis(self.fallback_buffer_ms)
    }

    /// Watchdog buffer as a duration.
    #[must_use]
    pub fn watchdog_buffer(&self) -> Duration {
        Duration::from_millis(self.watchdog_buffer_ms)
    }
}

impl Default for WatchdogOptions {
    fn default() -> Self {
        Self {
            fallback_buffer_ms: 50,
            watchdog_buffer_ms: 600,
        }
    }
}
