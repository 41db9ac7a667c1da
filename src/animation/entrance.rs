//! Entrance-only animation: appear centered on an anchor, then glide home.

use std::time::Duration;

use glam::DVec2;

use super::choreography::Choreography;
use super::finalize::{CompletionWatch, FinalizeCause, Observation};
use super::motion::resolve_duration;
use crate::geometry::css_translate;
use crate::host::{
    css_transition, restore_style, ElementId, FrameId, Host, HostEvent,
    StyleProp, TimerId,
};
use crate::options::{EntranceOptions, WatchdogOptions};

/// Progress of one entrance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntrancePhase {
    /// Shown at the anchor's center, waiting for the next frame.
    Center,
    /// Gliding to the layout position.
    Shifting,
    /// At rest in normal layout.
    #[default]
    Done,
}

#[derive(Debug)]
struct EntranceRun {
    element: ElementId,
    prior_transform: Option<String>,
    prior_transition: Option<String>,
    duration: Duration,
    frame: Option<FrameId>,
    frame_guard: Option<TimerId>,
    watch: Option<CompletionWatch>,
}

/// Plays the center-then-shift entrance on one element at a time.
#[derive(Debug)]
pub struct EntranceAnimator {
    options: EntranceOptions,
    watchdog: WatchdogOptions,
    phase: EntrancePhase,
    run: Option<EntranceRun>,
}

impl EntranceAnimator {
    /// Idle animator.
    #[must_use]
    pub fn new(options: EntranceOptions, watchdog: WatchdogOptions) -> Self {
        Self {
            options,
            watchdog,
            phase: EntrancePhase::Done,
            run: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> EntrancePhase {
        self.phase
    }

    /// Start an entrance of `element` from the center of `anchor`.
    ///
    /// Ignored while a previous entrance is still running.
    pub fn begin<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        element: ElementId,
        anchor: ElementId,
    ) -> EntrancePhase {
        if self.run.is_some() {
            return self.phase;
        }
        self.phase = EntrancePhase::Done;

        let duration = resolve_duration(
            host,
            self.options.duration(),
            self.options.disabled,
        );
        let (Some(rect), Some(anchor_rect)) =
            (host.bounding_rect(element), host.bounding_rect(anchor))
        else {
            log::debug!("entrance of {element} skipped: nothing to measure");
            return self.phase;
        };
        let offset = anchor_rect.center() - rect.center();
        if duration.is_zero() || !offset.is_finite() || offset == DVec2::ZERO {
            return self.phase;
        }

        let prior_transform = host.style(element, StyleProp::Transform);
        let prior_transition = host.style(element, StyleProp::Transition);
        host.set_style(element, StyleProp::Transition, "none");
        host.set_style(element, StyleProp::Transform, &css_translate(offset));

        self.run = Some(EntranceRun {
            element,
            prior_transform,
            prior_transition,
            duration,
            frame: Some(host.request_frame()),
            frame_guard: Some(
                host.set_timeout(duration + self.watchdog.watchdog_buffer()),
            ),
            watch: None,
        });
        self.phase = EntrancePhase::Center;
        self.phase
    }

    fn shift<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.frame = None;
        if let Some(guard) = run.frame_guard.take() {
            host.clear_timeout(guard);
        }
        host.force_reflow(run.element);
        let transition = css_transition(
            StyleProp::Transform,
            run.duration,
            &self.options.easing,
        );
        host.set_style(run.element, StyleProp::Transition, &transition);
        host.set_style(run.element, StyleProp::Transform, "none");
        run.watch = Some(CompletionWatch::arm(
            host,
            &[run.element],
            StyleProp::Transform,
            run.duration,
            &self.watchdog,
        ));
        self.phase = EntrancePhase::Shifting;
    }

    fn finish<H: Host + ?Sized>(&mut self, host: &mut H, cause: FinalizeCause) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        if let Some(frame) = run.frame.take() {
            host.cancel_frame(frame);
        }
        if let Some(guard) = run.frame_guard.take() {
            host.clear_timeout(guard);
        }
        if let Some(watch) = run.watch.as_mut() {
            let _ = watch.settle(host, cause);
        }
        restore_style(
            host,
            run.element,
            StyleProp::Transform,
            run.prior_transform.as_deref(),
        );
        restore_style(
            host,
            run.element,
            StyleProp::Transition,
            run.prior_transition.as_deref(),
        );
        self.phase = EntrancePhase::Done;
    }
}

impl<H: Host + ?Sized> Choreography<H> for EntranceAnimator {
    fn handle_event(&mut self, host: &mut H, event: &HostEvent) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        match event {
            HostEvent::Frame(id) if run.frame == Some(*id) => {
                self.shift(host);
                return true;
            }
            HostEvent::Timer(id) if run.frame_guard == Some(*id) => {
                run.frame_guard = None;
                log::warn!("no frame arrived for the entrance of {}", run.element);
                self.finish(host, FinalizeCause::Watchdog);
                return true;
            }
            _ => {}
        }
        let Some(watch) = run.watch.as_mut() else {
            return false;
        };
        match watch.observe(host, event) {
            Observation::Ignored => false,
            Observation::Counted => true,
            Observation::Finalized(cause) => {
                self.finish(host, cause);
                true
            }
        }
    }

    fn teardown(&mut self, host: &mut H) {
        self.finish(host, FinalizeCause::Teardown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::host::SimHost;

    fn setup() -> (SimHost, ElementId, ElementId) {
        let mut host = SimHost::new();
        let root = host.create_root(Rect::new(0.0, 0.0, 400.0, 400.0));
        let anchor = host.append_child(root, Rect::new(150.0, 150.0, 100.0, 100.0));
        let card = host.append_child(root, Rect::new(0.0, 300.0, 100.0, 50.0));
        (host, anchor, card)
    }

    #[test]
    fn test_center_then_shift_then_done() {
        let (mut host, anchor, card) = setup();
        host.set_style(card, StyleProp::Transform, "scale(1)");
        let mut entrance =
            EntranceAnimator::new(EntranceOptions::default(), WatchdogOptions::default());

        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Center);
        // Anchor center (200, 200), card center (50, 325).
        assert_eq!(
            host.inline_style(card, StyleProp::Transform),
            Some("translate(150px, -125px)")
        );

        let frames = host.take_frames();
        assert_eq!(host.dispatch(&mut entrance, frames), 1);
        assert_eq!(entrance.phase(), EntrancePhase::Shifting);
        assert_eq!(host.inline_style(card, StyleProp::Transform), Some("none"));

        // Ignored while running.
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Shifting);

        let ends = host.finish_transitions(StyleProp::Transform);
        let _ = host.dispatch(&mut entrance, ends);
        assert_eq!(entrance.phase(), EntrancePhase::Done);
        assert_eq!(host.inline_style(card, StyleProp::Transform), Some("scale(1)"));
        assert!(host.inline_style(card, StyleProp::Transition).is_none());
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_degenerate_inputs_go_straight_to_done() {
        let (mut host, anchor, card) = setup();
        let mut entrance =
            EntranceAnimator::new(EntranceOptions::default(), WatchdogOptions::default());

        // Already centered.
        host.set_rect(card, Rect::new(175.0, 175.0, 50.0, 50.0));
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Done);

        host.set_rect(card, Rect::new(f64::INFINITY, 0.0, 50.0, 50.0));
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Done);

        host.set_rect(card, Rect::new(0.0, 0.0, 50.0, 50.0));
        host.detach(anchor);
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Done);
        assert!(host.writes().is_empty());
    }

    #[test]
    fn test_zero_duration_never_touches_styles() {
        let (mut host, anchor, card) = setup();
        let options = EntranceOptions {
            disabled: true,
            ..EntranceOptions::default()
        };
        let mut entrance = EntranceAnimator::new(options, WatchdogOptions::default());
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Done);
        assert!(host.writes().is_empty());
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_teardown_before_first_frame() {
        let (mut host, anchor, card) = setup();
        let mut entrance =
            EntranceAnimator::new(EntranceOptions::default(), WatchdogOptions::default());
        let _ = entrance.begin(&mut host, card, anchor);
        Choreography::<SimHost>::teardown(&mut entrance, &mut host);
        assert_eq!(entrance.phase(), EntrancePhase::Done);
        assert_eq!(host.pending_frames(), 0);
        assert!(!host.has_inline_styles(card));
    }

    #[test]
    fn test_missing_first_frame_settles_on_guard() {
        let (mut host, anchor, card) = setup();
        let mut entrance =
            EntranceAnimator::new(EntranceOptions::default(), WatchdogOptions::default());
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Center);
        assert_eq!(host.pending_timers(), 1);

        // The frame never comes; only the guard timer fires.
        let fired = host.advance(Duration::from_secs(60));
        assert_eq!(host.dispatch(&mut entrance, fired), 1);
        assert_eq!(entrance.phase(), EntrancePhase::Done);
        assert!(!host.has_inline_styles(card));
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.pending_frames(), 0);

        // A new entrance can start afterwards.
        assert_eq!(entrance.begin(&mut host, card, anchor), EntrancePhase::Center);
    }

    #[test]
    fn test_guard_cleared_once_frame_arrives() {
        let (mut host, anchor, card) = setup();
        let mut entrance =
            EntranceAnimator::new(EntranceOptions::default(), WatchdogOptions::default());
        let _ = entrance.begin(&mut host, card, anchor);
        let frames = host.take_frames();
        let _ = host.dispatch(&mut entrance, frames);
        // Only the completion watch's fallback and watchdog remain.
        assert_eq!(host.pending_timers(), 2);
    }
}
