//! Deterministic in-memory host.
//!
//! `SimHost` keeps a small element tree with explicit rectangles, a virtual
//! clock, and a log of every inline style write tagged with the number of
//! reflows forced so far. Nothing happens on its own: tests pull frames,
//! advance the clock and complete transitions explicitly, then hand the
//! resulting [`HostEvent`]s to a choreography.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use rustc_hash::FxHashMap;

use super::{
    ElementId, FrameId, Host, HostEvent, ListenerId, Marker, StyleProp,
    TimerId, TrackSelector,
};
use crate::animation::{Choreography, TransitionKey};
use crate::geometry::Rect;

/// Upper bound on event-pump iterations in [`SimHost::run_until_idle`].
const MAX_PUMP_STEPS: usize = 10_000;

/// One inline style mutation observed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleWrite {
    /// Element written to.
    pub element: ElementId,
    /// Property written.
    pub prop: StyleProp,
    /// New value, `None` for a removal.
    pub value: Option<String>,
    /// Number of forced reflows that happened before this write.
    pub reflow_epoch: u64,
}

#[derive(Debug, Clone, Default)]
struct SimElement {
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    rect: Rect,
    styles: BTreeMap<StyleProp, String>,
    markers: BTreeSet<Marker>,
    attributes: BTreeSet<String>,
    classes: BTreeSet<String>,
    computed_transform: Option<String>,
    key: Option<TransitionKey>,
    attached: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    id: TimerId,
    due: Duration,
}

/// In-memory [`Host`] with a virtual clock.
#[derive(Debug, Default)]
pub struct SimHost {
    next_id: u64,
    elements: FxHashMap<ElementId, SimElement>,
    now: Duration,
    timers: Vec<PendingTimer>,
    frames: Vec<FrameId>,
    listeners: FxHashMap<ListenerId, ElementId>,
    reduced_motion: bool,
    reflows: u64,
    writes: Vec<StyleWrite>,
    mount_height: Option<f64>,
    refuse_mounts: bool,
}

impl SimHost {
    /// Empty host at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Create a detached-from-nothing root element (a container).
    pub fn create_root(&mut self, rect: Rect) -> ElementId {
        let id = ElementId(self.allocate());
        let _ = self.elements.insert(
            id,
            SimElement {
                rect,
                attached: true,
                ..SimElement::default()
            },
        );
        id
    }

    /// Append a new child element under `parent`.
    pub fn append_child(&mut self, parent: ElementId, rect: Rect) -> ElementId {
        let id = ElementId(self.allocate());
        let _ = self.elements.insert(
            id,
            SimElement {
                parent: Some(parent),
                rect,
                attached: true,
                ..SimElement::default()
            },
        );
        if let Some(p) = self.elements.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Move or resize an element (a layout change).
    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.rect = rect;
        }
    }

    /// Layout rectangle regardless of attachment.
    #[must_use]
    pub fn rect(&self, element: ElementId) -> Option<Rect> {
        self.elements.get(&element).map(|el| el.rect)
    }

    /// Tag an element with a plain attribute (for [`TrackSelector::Marked`]).
    pub fn set_attribute(&mut self, element: ElementId, name: &str) {
        if let Some(el) = self.elements.get_mut(&element) {
            let _ = el.attributes.insert(name.to_owned());
        }
    }

    /// Set the transform the host reports as computed style.
    pub fn set_computed_transform(
        &mut self,
        element: ElementId,
        transform: Option<&str>,
    ) {
        if let Some(el) = self.elements.get_mut(&element) {
            el.computed_transform = transform.map(str::to_owned);
        }
    }

    /// Flip the reduced-motion preference, as an OS setting change would.
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    /// Height given to content mounted via [`Host::mount`]. Defaults to the
    /// container's own height.
    pub fn set_mount_height(&mut self, height: f64) {
        self.mount_height = Some(height);
    }

    /// Make [`Host::mount`] fail, as a content renderer that errored would.
    pub fn set_refuse_mounts(&mut self, refuse: bool) {
        self.refuse_mounts = refuse;
    }

    /// Remove an element from its parent without going through a
    /// choreography, as a parent component tearing it down would.
    pub fn detach(&mut self, element: ElementId) {
        let parent = match self.elements.get_mut(&element) {
            Some(el) => {
                el.attached = false;
                el.parent.take()
            }
            None => None,
        };
        if let Some(p) = parent.and_then(|p| self.elements.get_mut(&p)) {
            p.children.retain(|&c| c != element);
        }
    }

    /// Whether the element is still in the tree.
    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        self.elements.get(&element).is_some_and(|el| el.attached)
    }

    /// Current inline value, borrowed.
    #[must_use]
    pub fn inline_style(
        &self,
        element: ElementId,
        prop: StyleProp,
    ) -> Option<&str> {
        self.elements
            .get(&element)
            .and_then(|el| el.styles.get(&prop))
            .map(String::as_str)
    }

    /// Whether any owned inline property is currently set.
    #[must_use]
    pub fn has_inline_styles(&self, element: ElementId) -> bool {
        self.elements
            .get(&element)
            .is_some_and(|el| !el.styles.is_empty())
    }

    /// CSS classes, sorted.
    #[must_use]
    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.elements
            .get(&element)
            .map(|el| el.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Key an element was mounted for.
    #[must_use]
    pub fn key_of(&self, element: ElementId) -> Option<&TransitionKey> {
        self.elements.get(&element).and_then(|el| el.key.as_ref())
    }

    /// Attached children, in order.
    #[must_use]
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.elements
            .get(&element)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    /// Every style write so far.
    #[must_use]
    pub fn writes(&self) -> &[StyleWrite] {
        &self.writes
    }

    /// Style writes touching one property of one element, in order.
    #[must_use]
    pub fn writes_for(
        &self,
        element: ElementId,
        prop: StyleProp,
    ) -> Vec<&StyleWrite> {
        self.writes
            .iter()
            .filter(|w| w.element == element && w.prop == prop)
            .collect()
    }

    /// Forget the write log (the tree keeps its styles).
    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    /// Number of forced reflows so far.
    #[must_use]
    pub fn reflow_count(&self) -> u64 {
        self.reflows
    }

    /// Virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Timers registered and not yet fired or cleared.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Ids of the pending timers, in registration order.
    #[must_use]
    pub fn pending_timer_ids(&self) -> Vec<TimerId> {
        self.timers.iter().map(|t| t.id).collect()
    }

    /// Frames requested and not yet delivered or cancelled.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Transition-end listeners currently attached.
    #[must_use]
    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver every requested frame.
    pub fn take_frames(&mut self) -> Vec<HostEvent> {
        self.frames.drain(..).map(HostEvent::Frame).collect()
    }

    /// Advance the clock and collect the timers that came due, in due order.
    pub fn advance(&mut self, by: Duration) -> Vec<HostEvent> {
        self.now += by;
        let now = self.now;
        let mut due: Vec<PendingTimer> =
            self.timers.iter().copied().filter(|t| t.due <= now).collect();
        self.timers.retain(|t| t.due > now);
        due.sort_by_key(|t| (t.due, t.id));
        due.into_iter().map(|t| HostEvent::Timer(t.id)).collect()
    }

    /// Native completion for every listened, attached element whose inline
    /// `transition` animates `prop`.
    pub fn finish_transitions(&mut self, prop: StyleProp) -> Vec<HostEvent> {
        let mut elements: Vec<ElementId> = self
            .listeners
            .values()
            .copied()
            .filter(|&el| self.transitions(el, prop))
            .collect();
        elements.sort_unstable();
        elements.dedup();
        elements
            .into_iter()
            .map(|element| HostEvent::TransitionEnd {
                element,
                property: prop.css_name().to_owned(),
            })
            .collect()
    }

    /// Native completion for one element and property, if anything listens.
    #[must_use]
    pub fn transition_end(
        &self,
        element: ElementId,
        property: &str,
    ) -> Option<HostEvent> {
        let listened = self.listeners.values().any(|&el| el == element);
        (listened && self.is_attached(element)).then(|| HostEvent::TransitionEnd {
            element,
            property: property.to_owned(),
        })
    }

    fn transitions(&self, element: ElementId, prop: StyleProp) -> bool {
        self.is_attached(element)
            && self
                .inline_style(element, StyleProp::Transition)
                .is_some_and(|t| t != "none" && t.contains(prop.css_name()))
    }

    /// Hand events to a choreography; returns how many it consumed.
    pub fn dispatch<C: Choreography<Self> + ?Sized>(
        &mut self,
        choreography: &mut C,
        events: Vec<HostEvent>,
    ) -> usize {
        let mut consumed = 0;
        for event in &events {
            if choreography.handle_event(self, event) {
                consumed += 1;
            }
        }
        consumed
    }

    /// Deliver frames and fire timers in order until nothing is pending.
    ///
    /// Native transition ends are *not* synthesized, so this exercises the
    /// fallback timer path. Returns the number of consumed events.
    pub fn run_until_idle<C: Choreography<Self> + ?Sized>(
        &mut self,
        choreography: &mut C,
    ) -> usize {
        let mut consumed = 0;
        for _ in 0..MAX_PUMP_STEPS {
            if !self.frames.is_empty() {
                let frames = self.take_frames();
                consumed += self.dispatch(choreography, frames);
                continue;
            }
            let Some(next) = self.timers.iter().map(|t| t.due).min() else {
                break;
            };
            let fired = self.advance(next.saturating_sub(self.now));
            consumed += self.dispatch(choreography, fired);
        }
        consumed
    }

    fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> =
            self.children(root).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    fn log_write(
        &mut self,
        element: ElementId,
        prop: StyleProp,
        value: Option<String>,
    ) {
        self.writes.push(StyleWrite {
            element,
            prop,
            value,
            reflow_epoch: self.reflows,
        });
    }
}

impl Host for SimHost {
    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        self.elements
            .get(&element)
            .filter(|el| el.attached)
            .map(|el| el.rect)
    }

    fn tracked_children(
        &self,
        container: ElementId,
        selector: &TrackSelector,
    ) -> Vec<ElementId> {
        match selector {
            TrackSelector::Children => self.children(container),
            TrackSelector::Marked(attr) => self
                .descendants(container)
                .into_iter()
                .filter(|id| {
                    self.elements
                        .get(id)
                        .is_some_and(|el| el.attributes.contains(attr))
                })
                .collect(),
        }
    }

    fn animation_target(&self, host_element: ElementId) -> ElementId {
        self.descendants(host_element)
            .into_iter()
            .find(|&id| self.has_marker(id, Marker::FlipTarget))
            .unwrap_or(host_element)
    }

    fn style(&self, element: ElementId, prop: StyleProp) -> Option<String> {
        self.inline_style(element, prop).map(str::to_owned)
    }

    fn set_style(&mut self, element: ElementId, prop: StyleProp, value: &str) {
        let Some(el) = self.elements.get_mut(&element) else {
            return;
        };
        let _ = el.styles.insert(prop, value.to_owned());
        self.log_write(element, prop, Some(value.to_owned()));
    }

    fn remove_style(&mut self, element: ElementId, prop: StyleProp) {
        let removed = self
            .elements
            .get_mut(&element)
            .and_then(|el| el.styles.remove(&prop))
            .is_some();
        if removed {
            self.log_write(element, prop, None);
        }
    }

    fn computed_transform(&self, element: ElementId) -> Option<String> {
        self.elements
            .get(&element)
            .and_then(|el| el.computed_transform.clone())
    }

    fn has_marker(&self, element: ElementId, marker: Marker) -> bool {
        self.elements
            .get(&element)
            .is_some_and(|el| el.markers.contains(&marker))
    }

    fn set_marker(&mut self, element: ElementId, marker: Marker) {
        if let Some(el) = self.elements.get_mut(&element) {
            let _ = el.markers.insert(marker);
        }
    }

    fn remove_marker(&mut self, element: ElementId, marker: Marker) {
        if let Some(el) = self.elements.get_mut(&element) {
            let _ = el.markers.remove(&marker);
        }
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(&element) {
            let _ = el.classes.insert(class.to_owned());
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(&element) {
            let _ = el.classes.remove(class);
        }
    }

    fn force_reflow(&mut self, _element: ElementId) {
        self.reflows += 1;
    }

    fn mount(
        &mut self,
        container: ElementId,
        key: &TransitionKey,
    ) -> Option<ElementId> {
        if self.refuse_mounts {
            return None;
        }
        let parent_rect = self.bounding_rect(container)?;
        let height = self.mount_height.unwrap_or(parent_rect.height);
        let id = self.append_child(
            container,
            Rect::new(parent_rect.left, parent_rect.top, parent_rect.width, height),
        );
        if let Some(el) = self.elements.get_mut(&id) {
            el.key = Some(key.clone());
        }
        Some(id)
    }

    fn unmount(&mut self, element: ElementId) {
        self.detach(element);
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.allocate());
        self.timers.push(PendingTimer {
            id,
            due: self.now + delay,
        });
        id
    }

    fn clear_timeout(&mut self, timer: TimerId) {
        self.timers.retain(|t| t.id != timer);
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.allocate());
        self.frames.push(id);
        id
    }

    fn cancel_frame(&mut self, frame: FrameId) {
        self.frames.retain(|&f| f != frame);
    }

    fn listen_transition_end(&mut self, element: ElementId) -> ListenerId {
        let id = ListenerId(self.allocate());
        let _ = self.listeners.insert(id, element);
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        let _ = self.listeners.remove(&listener);
    }
}
