//! Two-layer slide between route contents.
//!
//! On a key change the outgoing content stays mounted as an exit layer and
//! the incoming content is mounted next to it. Both are promoted to overlay
//! positioning inside a container whose height is pinned, then slide in
//! opposite directions. Once the [`CompletionWatch`] resolves, the exit
//! layer is unmounted, the entering layer is demoted back to normal flow,
//! and the container's height is released.
//!
//! Phases published to the [`TransitionStore`] go `Idle -> Overlay ->
//! Settled`, and only a new key goes back to `Overlay`.

use std::time::Duration;

use super::choreography::Choreography;
use super::finalize::{CompletionWatch, FinalizeCause, Observation};
use super::motion::resolve_duration;
use super::navigation::{Direction, DirectionLatch, NavigationIntent, TransitionKey};
use super::store::{
    TransitionKind, TransitionPhase, TransitionReader, TransitionState,
    TransitionStore,
};
use crate::host::{
    css_transition, restore_style, ElementId, FrameId, Host, HostEvent, Marker,
    StyleProp, TimerId,
};
use crate::options::{OverlayOptions, WatchdogOptions};

/// What [`OverlayChoreographer::navigate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// The key is already shown (or already entering); nothing changed.
    Ignored,
    /// A slide is in flight; the key starts once it finalizes.
    Queued,
    /// First content in the slot; mounted without animation.
    Mounted,
    /// Content swapped without animation.
    Settled,
    /// A slide started.
    Animating,
}

type DoneCallback = Box<dyn FnMut(&TransitionKey)>;

#[derive(Debug)]
struct Shown {
    key: TransitionKey,
    element: ElementId,
}

#[derive(Debug)]
struct SlidePass {
    key: TransitionKey,
    direction: Direction,
    duration: Duration,
    exit: ElementId,
    enter: ElementId,
    prior_height: Option<String>,
    frame: Option<FrameId>,
    /// Stands in for the completion watch until the first frame arrives.
    frame_guard: Option<TimerId>,
    watch: Option<CompletionWatch>,
}

/// Overlay slide choreographer for one content slot.
pub struct OverlayChoreographer {
    container: ElementId,
    options: OverlayOptions,
    watchdog: WatchdogOptions,
    store: TransitionStore,
    latch: DirectionLatch,
    shown: Option<Shown>,
    pass: Option<SlidePass>,
    pending: Option<(TransitionKey, NavigationIntent)>,
    on_done: Option<DoneCallback>,
}

impl OverlayChoreographer {
    /// Choreographer for `container`, publishing into `store`.
    #[must_use]
    pub fn new(
        container: ElementId,
        options: OverlayOptions,
        watchdog: WatchdogOptions,
        store: TransitionStore,
    ) -> Self {
        Self {
            container,
            options,
            watchdog,
            store,
            latch: DirectionLatch::new(),
            shown: None,
            pass: None,
            pending: None,
            on_done: None,
        }
    }

    /// Called once per settled navigation with the key that settled.
    pub fn set_on_done(&mut self, f: impl FnMut(&TransitionKey) + 'static) {
        self.on_done = Some(Box::new(f));
    }

    /// Read handle on the published state.
    #[must_use]
    pub fn reader(&self) -> TransitionReader {
        self.store.reader()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TransitionPhase {
        self.store.get().phase
    }

    /// Key shown (or entering).
    #[must_use]
    pub fn current_key(&self) -> Option<&TransitionKey> {
        self.shown.as_ref().map(|s| &s.key)
    }

    /// Element holding the shown (or entering) content.
    #[must_use]
    pub fn current_element(&self) -> Option<ElementId> {
        self.shown.as_ref().map(|s| s.element)
    }

    /// Whether a slide is in flight.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.pass.is_some()
    }

    /// Show `key`, sliding from the current content when there is some.
    pub fn navigate<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        key: TransitionKey,
        intent: NavigationIntent,
    ) -> NavigateOutcome {
        if let Some(pass) = &self.pass {
            if pass.key == key {
                // Returning to the in-flight key drops anything queued
                // behind it.
                self.pending = None;
                return NavigateOutcome::Ignored;
            }
            log::debug!("queueing {key} behind in-flight {}", pass.key);
            self.pending = Some((key, intent));
            return NavigateOutcome::Queued;
        }
        if self.current_key() == Some(&key) {
            return NavigateOutcome::Ignored;
        }

        let direction = self.latch.resolve(&key, intent);
        let Some(shown) = self.shown.take() else {
            return self.mount_first(host, key);
        };

        let duration =
            resolve_duration(host, self.options.duration(), self.options.disabled);
        if duration.is_zero() {
            return self.swap_now(host, Some(shown.element), key);
        }
        let Some(container_rect) = host.bounding_rect(self.container) else {
            log::warn!("{} is gone, swapping without a slide", self.container);
            return self.swap_now(host, Some(shown.element), key);
        };

        let prior_height = host.style(self.container, StyleProp::Height);
        host.set_style(
            self.container,
            StyleProp::Height,
            &format!("{}px", container_rect.height),
        );
        promote(host, shown.element);
        let Some(enter) = host.mount(self.container, &key) else {
            log::warn!("mounting {key} failed, settling");
            demote(host, shown.element);
            restore_style(
                host,
                self.container,
                StyleProp::Height,
                prior_height.as_deref(),
            );
            return self.swap_now(host, Some(shown.element), key);
        };
        promote(host, enter);

        self.store.publish(TransitionState {
            phase: TransitionPhase::Overlay,
            kind: Some(TransitionKind::Slide(direction)),
            key: Some(key.clone()),
        });
        log::debug!("sliding {} -> {key} ({direction:?}, {duration:?})", shown.key);

        let frame = host.request_frame();
        let frame_guard =
            host.set_timeout(duration + self.watchdog.watchdog_buffer());
        self.shown = Some(Shown {
            key: key.clone(),
            element: enter,
        });
        self.pass = Some(SlidePass {
            key,
            direction,
            duration,
            exit: shown.element,
            enter,
            prior_height,
            frame: Some(frame),
            frame_guard: Some(frame_guard),
            watch: None,
        });
        NavigateOutcome::Animating
    }

    fn mount_first<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        key: TransitionKey,
    ) -> NavigateOutcome {
        let Some(element) = host.mount(self.container, &key) else {
            log::warn!("mounting {key} failed, settling");
            return self.swap_now(host, None, key);
        };
        self.store.update(|s| s.key = Some(key.clone()));
        self.shown = Some(Shown { key, element });
        NavigateOutcome::Mounted
    }

    /// Replace content with no overlay state at all.
    fn swap_now<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        old: Option<ElementId>,
        key: TransitionKey,
    ) -> NavigateOutcome {
        if let Some(old) = old {
            host.unmount(old);
        }
        self.shown = host.mount(self.container, &key).map(|element| Shown {
            key: key.clone(),
            element,
        });
        self.store.publish(TransitionState {
            phase: TransitionPhase::Settled,
            kind: None,
            key: Some(key.clone()),
        });
        self.fire_done(&key);
        NavigateOutcome::Settled
    }

    fn fire_done(&mut self, key: &TransitionKey) {
        if let Some(on_done) = self.on_done.as_mut() {
            on_done(key);
        }
    }

    /// First frame: start transforms without transition, one reflow, then
    /// the real transition towards the end transforms.
    fn start_slide<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        pass.frame = None;
        if let Some(guard) = pass.frame_guard.take() {
            host.clear_timeout(guard);
        }

        let sign = pass.direction.sign();
        host.set_style(pass.enter, StyleProp::Transition, "none");
        host.set_style(pass.enter, StyleProp::Transform, &translate_x(sign * 100));
        host.set_style(pass.exit, StyleProp::Transition, "none");
        host.set_style(pass.exit, StyleProp::Transform, &translate_x(0));
        host.force_reflow(self.container);

        let transition =
            css_transition(StyleProp::Transform, pass.duration, &self.options.easing);
        for layer in [pass.enter, pass.exit] {
            host.set_style(layer, StyleProp::Transition, &transition);
        }
        host.set_style(pass.enter, StyleProp::Transform, &translate_x(0));
        host.set_style(pass.exit, StyleProp::Transform, &translate_x(-sign * 100));

        pass.watch = Some(CompletionWatch::arm(
            host,
            &[pass.enter, pass.exit],
            StyleProp::Transform,
            pass.duration,
            &self.watchdog,
        ));
    }

    /// Tear the overlay down and settle on the entering layer.
    fn finish<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        cause: FinalizeCause,
    ) -> Option<TransitionKey> {
        let mut pass = self.pass.take()?;
        if let Some(frame) = pass.frame.take() {
            host.cancel_frame(frame);
        }
        if let Some(guard) = pass.frame_guard.take() {
            host.clear_timeout(guard);
        }
        if let Some(watch) = pass.watch.as_mut() {
            watch.disarm(host);
        }

        host.unmount(pass.exit);
        host.set_style(pass.enter, StyleProp::Transition, "none");
        host.set_style(pass.enter, StyleProp::Animation, "none");
        demote(host, pass.enter);
        host.remove_style(pass.enter, StyleProp::Transform);
        host.force_reflow(self.container);
        host.remove_style(pass.enter, StyleProp::Transition);
        host.remove_style(pass.enter, StyleProp::Animation);
        restore_style(
            host,
            self.container,
            StyleProp::Height,
            pass.prior_height.as_deref(),
        );

        self.store.publish(TransitionState {
            phase: TransitionPhase::Settled,
            kind: None,
            key: Some(pass.key.clone()),
        });
        log::debug!("slide to {} settled: {cause:?}", pass.key);
        Some(pass.key)
    }

    fn complete<H: Host + ?Sized>(&mut self, host: &mut H, cause: FinalizeCause) {
        let Some(key) = self.finish(host, cause) else {
            return;
        };
        self.fire_done(&key);
        if let Some((next, intent)) = self.pending.take() {
            let outcome = self.navigate(host, next, intent);
            log::debug!("queued navigation: {outcome:?}");
        }
    }
}

impl<H: Host + ?Sized> Choreography<H> for OverlayChoreographer {
    fn handle_event(&mut self, host: &mut H, event: &HostEvent) -> bool {
        let Some(pass) = self.pass.as_mut() else {
            return false;
        };
        match event {
            HostEvent::Frame(id) if pass.frame == Some(*id) => {
                self.start_slide(host);
                return true;
            }
            HostEvent::Timer(id) if pass.frame_guard == Some(*id) => {
                pass.frame_guard = None;
                log::warn!("no frame arrived for the slide to {}", pass.key);
                self.complete(host, FinalizeCause::Watchdog);
                return true;
            }
            _ => {}
        }
        let Some(watch) = pass.watch.as_mut() else {
            return false;
        };
        match watch.observe(host, event) {
            Observation::Ignored => false,
            Observation::Counted => true,
            Observation::Finalized(cause) => {
                self.complete(host, cause);
                true
            }
        }
    }

    fn teardown(&mut self, host: &mut H) {
        self.pending = None;
        if let Some(watch) = self.pass.as_mut().and_then(|p| p.watch.as_mut()) {
            let _ = watch.settle(host, FinalizeCause::Teardown);
        }
        let _ = self.finish(host, FinalizeCause::Teardown);
    }
}

impl std::fmt::Debug for OverlayChoreographer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayChoreographer")
            .field("container", &self.container)
            .field("shown", &self.shown)
            .field("pass", &self.pass)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

fn translate_x(percent: i32) -> String {
    format!("translateX({percent}%)")
}

const OVERLAY_VALUES: [(StyleProp, &str); 5] = [
    (StyleProp::Position, "absolute"),
    (StyleProp::Top, "0"),
    (StyleProp::Left, "0"),
    (StyleProp::Width, "100%"),
    (StyleProp::WillChange, "transform"),
];

fn promote<H: Host + ?Sized>(host: &mut H, layer: ElementId) {
    for (prop, value) in OVERLAY_VALUES {
        host.set_style(layer, prop, value);
    }
    host.set_marker(layer, Marker::OverlayLayer);
}

fn demote<H: Host + ?Sized>(host: &mut H, layer: ElementId) {
    for prop in StyleProp::OVERLAY {
        host.remove_style(layer, prop);
    }
    host.remove_marker(layer, Marker::OverlayLayer);
}
