use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::Axis;
use crate::host::TrackSelector;
use crate::util::easing::Easing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "FLIP", inline)]
#[serde(default)]
/// Layout-change (FLIP) animation parameters.
pub struct FlipOptions {
    /// Requested duration before the reduced-motion clamp.
    #[schemars(title = "Duration (ms)", range(min = 0, max = 2000), extend("step" = 10))]
    pub duration_ms: u64,
    /// Timing curve.
    #[schemars(title = "Easing")]
    pub easing: Easing,
    /// Which descendants of the container are tracked.
    #[schemars(skip)]
    pub selector: TrackSelector,
    /// Never animate; only keep the baseline current.
    #[schemars(title = "Disabled")]
    pub disabled: bool,
    /// Restrict motion to one axis.
    #[schemars(title = "Lock Axis")]
    pub lock_axis: Option<Axis>,
    /// Combine with an existing computed transform instead of replacing it.
    #[schemars(title = "Compose Transforms")]
    pub compose_transforms: bool,
}

impl FlipOptions {
    /// Requested duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for FlipOptions {
    fn default() -> Self {
        Self {
            duration_ms: 250,
            easing: Easing::DEFAULT,
            selector: TrackSelector::Children,
            disabled: false,
            lock_axis: None,
            compose_transforms: false,
        }
    }
}
