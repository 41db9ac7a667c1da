// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Page-transition choreography against an abstract retained-mode UI host.
//!
//! Segue coordinates the imperative half of route and layout transitions:
//! measuring elements, writing inverted transforms, forcing the reflow that
//! commits them, releasing them with a transition, and cleaning up exactly
//! once no matter which completion signal arrives first.
//!
//! # Key entry points
//!
//! - [`animation::FlipEngine`] - FLIP glides for reordered children
//! - [`animation::OverlayChoreographer`] - two-layer slide between routes
//! - [`animation::FadeSwitch`] - keyed class-lifecycle cross-fade
//! - [`animation::EntranceAnimator`] - center-then-shift entrance
//! - [`animation::TransitionStore`] - observable "current transition" state
//! - [`host::Host`] - the UI seam; [`host::SimHost`] for tests and replays
//! - [`options::Options`] - durations, easing and watchdog buffers (TOML)
//!
//! # Architecture
//!
//! Everything runs on one thread. Choreographers never block: they write
//! styles through the [`host::Host`] trait and register timers, frames and
//! transition-end listeners with it. The host reports those back as
//! [`host::HostEvent`]s, which the embedder routes to every live
//! [`animation::Choreography`]. Each pass arms an
//! [`animation::CompletionWatch`] that resolves on native completion, on a
//! fallback timer, or on a longer watchdog timer, whichever fires first.

pub mod animation;
pub mod error;
pub mod geometry;
pub mod host;
pub mod options;
pub mod util;
