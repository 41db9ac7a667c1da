//! FLIP layout animation for a container's tracked descendants.
//!
//! Call [`FlipEngine::reconcile`] after every commit that may have moved the
//! tracked elements. Each call measures the elements, compares against the
//! rectangles stored by the previous call, and, for every element that
//! moved, plays First-Last-Invert-Play:
//!
//! 1. write `transition: none` and the inverted `translate(dx, dy)`,
//! 2. force one reflow of the container (one per pass, not per element),
//! 3. write the real transition and release the transform to identity.
//!
//! The pass then waits on a [`CompletionWatch`]. At finalize every element
//! gets back its exact prior inline `transform`/`transition`, and the
//! container's motion marker is removed if this pass added it. The new
//! rectangles always become the next baseline, whether or not anything
//! animated.

use std::time::Duration;

use glam::DVec2;
use rustc_hash::FxHashMap;

use super::choreography::Choreography;
use super::finalize::{CompletionWatch, FinalizeCause, Observation};
use super::motion::resolve_duration;
use crate::geometry::{css_translate, flip_offset, Rect};
use crate::host::{
    css_transition, restore_style, ElementId, Host, HostEvent, Marker,
    StyleProp,
};
use crate::options::{FlipOptions, WatchdogOptions};

/// Rendering context of the container being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Live, in-flow content. Animates.
    #[default]
    Active,
    /// Content inside an exiting overlay layer. Never animates; its motion
    /// would fight the layer's own slide.
    Exit,
    /// Content outside any route transition. Animates.
    Static,
}

impl Role {
    fn allows_motion(self) -> bool {
        !matches!(self, Role::Exit)
    }
}

/// One moved element in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipEntry {
    /// Tracked element (the baseline key).
    pub host: ElementId,
    /// Element that receives the transform.
    pub target: ElementId,
    /// Rectangle from the previous pass.
    pub previous: Rect,
    /// Rectangle measured now.
    pub current: Rect,
    /// Inverted translation, `previous - current`.
    pub offset: DVec2,
    /// Inline `transform` before the pass.
    pub previous_transform: Option<String>,
    /// Inline `transition` before the pass.
    pub previous_transition: Option<String>,
    /// Computed transform to release to when composing.
    pub base_transform: Option<String>,
}

impl FlipEntry {
    fn inverted_transform(&self) -> String {
        let translate = css_translate(self.offset);
        match &self.base_transform {
            Some(base) => format!("{translate} {base}"),
            None => translate,
        }
    }

    fn released_transform(&self) -> &str {
        self.base_transform.as_deref().unwrap_or("none")
    }
}

/// Result of one [`FlipEngine::reconcile`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Tracked elements that could be measured.
    pub tracked: usize,
    /// Elements that started a glide.
    pub animated: usize,
}

#[derive(Debug)]
struct FlipPass {
    entries: Vec<FlipEntry>,
    watch: CompletionWatch,
    added_marker: bool,
}

/// FLIP engine bound to one container.
#[derive(Debug)]
pub struct FlipEngine {
    container: ElementId,
    options: FlipOptions,
    watchdog: WatchdogOptions,
    baseline: FxHashMap<ElementId, Rect>,
    pass: Option<FlipPass>,
    completed: usize,
}

impl FlipEngine {
    /// Engine for `container` with an empty baseline.
    #[must_use]
    pub fn new(
        container: ElementId,
        options: FlipOptions,
        watchdog: WatchdogOptions,
    ) -> Self {
        Self {
            container,
            options,
            watchdog,
            baseline: FxHashMap::default(),
            pass: None,
            completed: 0,
        }
    }

    /// Container this engine tracks.
    #[must_use]
    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Rectangle stored for a tracked element by the last pass.
    #[must_use]
    pub fn baseline(&self, host_element: ElementId) -> Option<Rect> {
        self.baseline.get(&host_element).copied()
    }

    /// Number of elements in the stored baseline.
    #[must_use]
    pub fn baseline_len(&self) -> usize {
        self.baseline.len()
    }

    /// Whether a pass is waiting for completion.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.pass.is_some()
    }

    /// Number of passes that have finalized so far.
    #[must_use]
    pub fn completed_passes(&self) -> usize {
        self.completed
    }

    /// Measure, compare with the baseline, and animate whatever moved.
    pub fn reconcile<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        role: Role,
    ) -> ReconcileReport {
        if let Some(mut pass) = self.pass.take() {
            if pass.watch.settle(host, FinalizeCause::Superseded).is_some() {
                self.restore(host, &pass);
            }
        }

        let hosts = host.tracked_children(self.container, &self.options.selector);
        if hosts.is_empty() {
            self.baseline.clear();
            return ReconcileReport::default();
        }

        let mut measured = Vec::with_capacity(hosts.len());
        for &el in &hosts {
            let target = host.animation_target(el);
            match host.bounding_rect(target) {
                Some(rect) => measured.push((el, target, rect)),
                None => log::debug!("{el} vanished before measuring"),
            }
        }

        let duration =
            resolve_duration(host, self.options.duration(), self.options.disabled);
        let entries = if duration.is_zero() || !role.allows_motion() {
            Vec::new()
        } else {
            self.moved_entries(host, &measured)
        };

        self.baseline = measured
            .iter()
            .map(|&(el, _, rect)| (el, rect))
            .collect();

        let report = ReconcileReport {
            tracked: measured.len(),
            animated: entries.len(),
        };
        if !entries.is_empty() {
            self.play(host, entries, duration);
        }
        report
    }

    fn moved_entries<H: Host + ?Sized>(
        &self,
        host: &H,
        measured: &[(ElementId, ElementId, Rect)],
    ) -> Vec<FlipEntry> {
        let mut entries = Vec::new();
        for &(el, target, current) in measured {
            let Some(previous) = self.baseline.get(&el).copied() else {
                continue;
            };
            let Some(offset) =
                flip_offset(&previous, &current, self.options.lock_axis)
            else {
                log::warn!("{el}: non-finite FLIP offset, snapping");
                continue;
            };
            if offset == DVec2::ZERO {
                continue;
            }
            let base_transform = if self.options.compose_transforms {
                host.computed_transform(target)
            } else {
                None
            };
            entries.push(FlipEntry {
                host: el,
                target,
                previous,
                current,
                offset,
                previous_transform: host.style(target, StyleProp::Transform),
                previous_transition: host.style(target, StyleProp::Transition),
                base_transform,
            });
        }
        entries
    }

    fn play<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        entries: Vec<FlipEntry>,
        duration: Duration,
    ) {
        let added_marker = !host.has_marker(self.container, Marker::MotionAllowed);
        if added_marker {
            host.set_marker(self.container, Marker::MotionAllowed);
        }

        for entry in &entries {
            host.set_style(entry.target, StyleProp::Transition, "none");
            host.set_style(
                entry.target,
                StyleProp::Transform,
                &entry.inverted_transform(),
            );
        }
        host.force_reflow(self.container);

        let transition =
            css_transition(StyleProp::Transform, duration, &self.options.easing);
        for entry in &entries {
            host.set_style(entry.target, StyleProp::Transition, &transition);
            host.set_style(
                entry.target,
                StyleProp::Transform,
                entry.released_transform(),
            );
        }

        let targets: Vec<ElementId> = entries.iter().map(|e| e.target).collect();
        let watch = CompletionWatch::arm(
            host,
            &targets,
            StyleProp::Transform,
            duration,
            &self.watchdog,
        );
        log::debug!(
            "FLIP pass on {}: {} element(s) over {duration:?}",
            self.container,
            entries.len()
        );
        self.pass = Some(FlipPass {
            entries,
            watch,
            added_marker,
        });
    }

    fn restore<H: Host + ?Sized>(&mut self, host: &mut H, pass: &FlipPass) {
        for entry in &pass.entries {
            restore_style(
                host,
                entry.target,
                StyleProp::Transform,
                entry.previous_transform.as_deref(),
            );
            restore_style(
                host,
                entry.target,
                StyleProp::Transition,
                entry.previous_transition.as_deref(),
            );
        }
        if pass.added_marker {
            host.remove_marker(self.container, Marker::MotionAllowed);
        }
        self.completed += 1;
    }
}

impl<H: Host + ?Sized> Choreography<H> for FlipEngine {
    fn handle_event(&mut self, host: &mut H, event: &HostEvent) -> bool {
        let Some(pass) = self.pass.as_mut() else {
            return false;
        };
        match pass.watch.observe(host, event) {
            Observation::Ignored => false,
            Observation::Counted => true,
            Observation::Finalized(cause) => {
                if let Some(pass) = self.pass.take() {
                    self.restore(host, &pass);
                }
                log::debug!("FLIP pass on {} done: {cause:?}", self.container);
                true
            }
        }
    }

    fn teardown(&mut self, host: &mut H) {
        if let Some(mut pass) = self.pass.take() {
            if pass.watch.settle(host, FinalizeCause::Teardown).is_some() {
                self.restore(host, &pass);
            }
        }
        self.baseline.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Axis;
    use crate::host::SimHost;

    fn list(host: &mut SimHost, n: usize) -> (ElementId, Vec<ElementId>) {
        let root = host.create_root(Rect::new(0.0, 0.0, 200.0, 400.0));
        let items = (0..n)
            .map(|i| {
                host.append_child(root, Rect::new(0.0, i as f64 * 50.0, 200.0, 50.0))
            })
            .collect();
        (root, items)
    }

    fn engine(root: ElementId) -> FlipEngine {
        FlipEngine::new(root, FlipOptions::default(), WatchdogOptions::default())
    }

    fn swap(host: &mut SimHost, a: ElementId, b: ElementId) {
        let (ra, rb) = (host.rect(a).unwrap(), host.rect(b).unwrap());
        host.set_rect(a, rb);
        host.set_rect(b, ra);
    }

    #[test]
    fn test_reorder_glides_and_updates_baseline() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);

        let first = flip.reconcile(&mut host, Role::Active);
        assert_eq!(first, ReconcileReport { tracked: 2, animated: 0 });
        assert!(host.writes().is_empty());

        swap(&mut host, items[0], items[1]);
        let report = flip.reconcile(&mut host, Role::Active);
        assert_eq!(report, ReconcileReport { tracked: 2, animated: 2 });

        let inverted: Vec<_> = items
            .iter()
            .map(|&el| host.writes_for(el, StyleProp::Transform)[0].value.clone())
            .collect();
        assert_eq!(inverted[0].as_deref(), Some("translate(0px, -50px)"));
        assert_eq!(inverted[1].as_deref(), Some("translate(0px, 50px)"));
        assert!(host.has_marker(root, Marker::MotionAllowed));

        let ends = host.finish_transitions(StyleProp::Transform);
        assert_eq!(host.dispatch(&mut flip, ends), 2);
        assert!(!flip.is_animating());

        assert_eq!(flip.baseline(items[0]).map(|r| r.top), Some(50.0));
        assert_eq!(flip.baseline(items[1]).map(|r| r.top), Some(0.0));
        for &el in &items {
            assert!(host.inline_style(el, StyleProp::Transform).is_none());
            assert!(!host.has_inline_styles(el));
        }
        assert!(!host.has_marker(root, Marker::MotionAllowed));
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.active_listeners(), 0);
    }

    #[test]
    fn test_inverted_write_precedes_reflow_precedes_release() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 3);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[2]);
        let before = host.reflow_count();
        let _ = flip.reconcile(&mut host, Role::Active);

        // One reflow for the whole batch.
        assert_eq!(host.reflow_count(), before + 1);
        for el in [items[0], items[2]] {
            let writes = host.writes_for(el, StyleProp::Transform);
            assert_eq!(writes.len(), 2);
            assert!(writes[0].value.as_deref().unwrap().starts_with("translate("));
            assert_eq!(writes[0].reflow_epoch, before);
            assert_eq!(writes[1].value.as_deref(), Some("none"));
            assert_eq!(writes[1].reflow_epoch, before + 1);

            let transitions = host.writes_for(el, StyleProp::Transition);
            assert_eq!(transitions[0].value.as_deref(), Some("none"));
            assert_eq!(
                transitions[1].value.as_deref(),
                Some("transform 250ms cubic-bezier(0.2, 0, 0, 1)")
            );
        }
        // The middle item did not move.
        assert!(host.writes_for(items[1], StyleProp::Transform).is_empty());
    }

    #[test]
    fn test_restore_runs_once_across_all_completion_paths() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);

        // Collect both timers as if they fired late, then deliver native
        // completions first and the timers afterwards.
        let timers = host.advance(Duration::from_secs(5));
        assert_eq!(timers.len(), 2);
        let ends: Vec<HostEvent> = items
            .iter()
            .map(|&el| HostEvent::TransitionEnd {
                element: el,
                property: "transform".to_owned(),
            })
            .collect();
        let _ = host.dispatch(&mut flip, ends);
        assert_eq!(host.dispatch(&mut flip, timers), 0);

        assert_eq!(flip.completed_passes(), 1);
        for &el in &items {
            let removals = host
                .writes_for(el, StyleProp::Transform)
                .into_iter()
                .filter(|w| w.value.is_none())
                .count();
            assert_eq!(removals, 1);
        }
    }

    #[test]
    fn test_prior_inline_styles_are_restored_exactly() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        host.set_style(items[0], StyleProp::Transform, "rotate(2deg)");
        host.set_style(items[0], StyleProp::Transition, "opacity 1s");
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);
        let _ = host.run_until_idle(&mut flip);

        assert_eq!(
            host.inline_style(items[0], StyleProp::Transform),
            Some("rotate(2deg)")
        );
        assert_eq!(
            host.inline_style(items[0], StyleProp::Transition),
            Some("opacity 1s")
        );
        assert!(!host.has_inline_styles(items[1]));
    }

    #[test]
    fn test_fallback_finalizes_when_element_is_removed() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);

        host.detach(items[1]);
        let ends = host.finish_transitions(StyleProp::Transform);
        assert_eq!(ends.len(), 1);
        let _ = host.dispatch(&mut flip, ends);
        assert!(flip.is_animating());

        let fired = host.advance(Duration::from_millis(300));
        assert_eq!(host.dispatch(&mut flip, fired), 1);
        assert!(!flip.is_animating());
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_marker_set_by_someone_else_is_kept() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        host.set_marker(root, Marker::MotionAllowed);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);
        let _ = host.run_until_idle(&mut flip);
        assert!(host.has_marker(root, Marker::MotionAllowed));
    }

    #[test]
    fn test_zero_duration_stores_baseline_without_style_churn() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let options = FlipOptions {
            duration_ms: 0,
            ..FlipOptions::default()
        };
        let mut flip = FlipEngine::new(root, options, WatchdogOptions::default());
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let report = flip.reconcile(&mut host, Role::Active);

        assert_eq!(report.animated, 0);
        assert!(host.writes().is_empty());
        assert_eq!(host.reflow_count(), 0);
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(flip.baseline(items[0]).map(|r| r.top), Some(50.0));
    }

    #[test]
    fn test_reduced_motion_is_read_live() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);

        host.set_reduced_motion(true);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);
        let transition = host.writes_for(items[0], StyleProp::Transition)[1]
            .value
            .clone();
        assert_eq!(
            transition.as_deref(),
            Some("transform 100ms cubic-bezier(0.2, 0, 0, 1)")
        );
    }

    #[test]
    fn test_disabled_and_exit_role_never_animate() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Exit);
        swap(&mut host, items[0], items[1]);
        assert_eq!(flip.reconcile(&mut host, Role::Exit).animated, 0);
        assert!(host.writes().is_empty());

        let options = FlipOptions {
            disabled: true,
            ..FlipOptions::default()
        };
        let mut off = FlipEngine::new(root, options, WatchdogOptions::default());
        let _ = off.reconcile(&mut host, Role::Static);
        swap(&mut host, items[0], items[1]);
        assert_eq!(off.reconcile(&mut host, Role::Static).animated, 0);
        assert!(host.writes().is_empty());
    }

    #[test]
    fn test_lock_axis_and_compose() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 1);
        host.set_computed_transform(items[0], Some("scale(1.5)"));
        let options = FlipOptions {
            lock_axis: Some(Axis::X),
            compose_transforms: true,
            ..FlipOptions::default()
        };
        let mut flip = FlipEngine::new(root, options, WatchdogOptions::default());
        let _ = flip.reconcile(&mut host, Role::Active);

        host.set_rect(items[0], Rect::new(30.0, 80.0, 200.0, 50.0));
        let _ = flip.reconcile(&mut host, Role::Active);
        let writes = host.writes_for(items[0], StyleProp::Transform);
        assert_eq!(
            writes[0].value.as_deref(),
            Some("translate(-30px, 0px) scale(1.5)")
        );
        assert_eq!(writes[1].value.as_deref(), Some("scale(1.5)"));

        // Motion only on the unlocked axis counts as movement.
        host.clear_writes();
        let ends = host.finish_transitions(StyleProp::Transform);
        let _ = host.dispatch(&mut flip, ends);
        host.clear_writes();
        host.set_rect(items[0], Rect::new(30.0, 0.0, 200.0, 50.0));
        assert_eq!(flip.reconcile(&mut host, Role::Active).animated, 0);
    }

    #[test]
    fn test_flip_target_receives_transform() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let inner = host.append_child(items[0], Rect::new(0.0, 0.0, 200.0, 50.0));
        host.set_marker(inner, Marker::FlipTarget);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);

        host.set_rect(inner, Rect::new(0.0, 100.0, 200.0, 50.0));
        let report = flip.reconcile(&mut host, Role::Active);
        assert_eq!(report.animated, 1);
        assert!(host.writes_for(items[0], StyleProp::Transform).is_empty());
        assert_eq!(
            host.writes_for(inner, StyleProp::Transform)[0].value.as_deref(),
            Some("translate(0px, -100px)")
        );
    }

    #[test]
    fn test_non_finite_and_missing_elements_snap() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 3);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);

        host.set_rect(items[0], Rect::new(f64::NAN, 0.0, 200.0, 50.0));
        host.detach(items[1]);
        let report = flip.reconcile(&mut host, Role::Active);
        assert_eq!(report, ReconcileReport { tracked: 2, animated: 0 });
        assert!(host.writes().is_empty());
        assert!(flip.baseline(items[1]).is_none());
    }

    #[test]
    fn test_empty_container_clears_baseline() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        assert_eq!(flip.baseline_len(), 2);
        for el in items {
            host.detach(el);
        }
        assert_eq!(flip.reconcile(&mut host, Role::Active), ReconcileReport::default());
        assert_eq!(flip.baseline_len(), 0);
    }

    #[test]
    fn test_reconcile_mid_flight_supersedes_previous_pass() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);
        assert!(flip.is_animating());

        swap(&mut host, items[0], items[1]);
        let report = flip.reconcile(&mut host, Role::Active);
        assert_eq!(report.animated, 2);
        assert_eq!(flip.completed_passes(), 1);
        // Only the new pass's timers and listeners remain.
        assert_eq!(host.pending_timers(), 2);
        assert_eq!(host.active_listeners(), 2);

        let _ = host.run_until_idle(&mut flip);
        assert_eq!(flip.completed_passes(), 2);
        assert!(!host.has_inline_styles(items[0]));
    }

    #[test]
    fn test_teardown_restores_and_detaches() {
        let mut host = SimHost::new();
        let (root, items) = list(&mut host, 2);
        let mut flip = engine(root);
        let _ = flip.reconcile(&mut host, Role::Active);
        swap(&mut host, items[0], items[1]);
        let _ = flip.reconcile(&mut host, Role::Active);

        Choreography::<SimHost>::teardown(&mut flip, &mut host);
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.active_listeners(), 0);
        assert!(!host.has_inline_styles(items[0]));
        assert!(!host.has_marker(root, Marker::MotionAllowed));
        assert_eq!(flip.baseline_len(), 0);
    }
}
