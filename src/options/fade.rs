use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::util::easing::Easing;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Fade", inline)]
#[serde(default)]
/// Class-driven cross-fade for top-level routes.
pub struct FadeOptions {
    /// How long the exit/enter classes stay applied.
    #[schemars(title = "Duration (ms)", range(min = 0, max = 2000), extend("step" = 10))]
    pub duration_ms: u64,
    /// Timing curve. Only informative here; the stylesheet owns the actual
    /// transition.
    #[schemars(title = "Easing")]
    pub easing: Easing,
    /// Swap content without fading.
    #[schemars(title = "Disabled")]
    pub disabled: bool,
    /// Class prefix: `<name>-enter`, `<name>-enter-active`, `<name>-exit`,
    /// `<name>-exit-active`.
    #[schemars(title = "Class Name")]
    pub class_name: String,
}

impl FadeOptions {
    /// Requested duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// `<name>-<suffix>`.
    #[must_use]
    pub fn class(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.class_name)
    }
}

impl Default for FadeOptions {
    fn default() -> Self {
        Self {
            duration_ms: 300,
            easing: Easing::EaseInOut,
            disabled: false,
            class_name: "fade".to_owned(),
        }
    }
}
