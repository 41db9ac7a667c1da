use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::easing::Easing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Overlay", inline)]
#[serde(default)]
/// Two-layer slide between route contents.
pub struct OverlayOptions {
    /// Requested slide duration before the reduced-motion clamp.
    #[schemars(title = "Duration (ms)", range(min = 0, max = 2000), extend("step" = 10))]
    pub duration_ms: u64,
    /// Timing curve shared by both layers.
    #[schemars(title = "Easing")]
    pub easing: Easing,
    /// Swap content without sliding.
    #[schemars(title = "Disabled")]
    pub disabled: bool,
}

impl OverlayOptions {
    /// Requested duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            duration_ms: 400,
            easing: Easing::DEFAULT,
            disabled: false,
        }
    }
}
