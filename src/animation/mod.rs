//! Transition choreography.
//!
//! Four choreographers share one event seam ([`Choreography`]) and one
//! completion protocol ([`CompletionWatch`]):
//!
//! - [`FlipEngine`]: glides reordered elements from their old positions.
//! - [`OverlayChoreographer`]: two-layer slide between route contents.
//! - [`FadeSwitch`]: class-driven cross-fade for top-level routes.
//! - [`EntranceAnimator`]: center-then-shift entrance of one element.
//!
//! The overlay and fade adapters publish into a [`TransitionStore`] that
//! unrelated UI reads through [`TransitionReader`] handles.

mod choreography;
mod entrance;
mod fade;
pub mod finalize;
mod flip;
pub mod motion;
mod navigation;
mod overlay;
mod store;

pub use choreography::Choreography;
pub use entrance::{EntranceAnimator, EntrancePhase};
pub use fade::{FadeSwitch, SwitchOutcome};
pub use finalize::{CompletionWatch, FinalizeCause, Observation};
pub use flip::{FlipEngine, FlipEntry, ReconcileReport, Role};
pub use motion::{effective_duration, resolve_duration, REDUCED_MOTION_CAP};
pub use navigation::{Direction, DirectionLatch, NavigationIntent, TransitionKey};
pub use overlay::{NavigateOutcome, OverlayChoreographer};
pub use store::{
    SubscriptionId, TransitionKind, TransitionPhase, TransitionReader,
    TransitionState, TransitionStore,
};
