use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::easing::Easing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Entrance", inline)]
#[serde(default)]
/// Center-then-shift entrance of a single element.
pub struct EntranceOptions {
    /// Requested shift duration before the reduced-motion clamp.
    #[schemars(title = "Duration (ms)", range(min = 0, max = 2000), extend("step" = 10))]
    pub duration_ms: u64,
    /// Timing curve.
    #[schemars(title = "Easing")]
    pub easing: Easing,
    /// Show the element in place without the shift.
    #[schemars(title = "Disabled")]
    pub disabled: bool,
}

impl EntranceOptions {
    /// Requested duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for EntranceOptions {
    fn default() -> Self {
        Self {
            duration_ms: 500,
            easing: Easing::DEFAULT,
            disabled: false,
        }
    }
}
