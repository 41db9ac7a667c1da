//! DOM host over `web-sys`.
//!
//! Browser callbacks (timers, animation frames, `transitionend`) push
//! [`HostEvent`]s into a shared queue and then call the wake hook. The
//! embedder drains the queue with [`WebHost::drain_events`] and routes each
//! event to its choreographies.
//!
//! Elements are identified by a `data-segue-id` attribute assigned the first
//! time the host sees them. Ids of elements that left the document are
//! pruned on every tracked-children query.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use rustc_hash::FxHashMap;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast as _;
use web_sys::{Element, HtmlElement, TransitionEvent, Window};

use super::registry::Registry;
use super::{
    ElementId, FrameId, Host, HostEvent, ListenerId, Marker, StyleProp,
    TimerId, TrackSelector,
};
use crate::animation::TransitionKey;
use crate::error::SegueError;
use crate::geometry::Rect;

const ID_ATTRIBUTE: &str = "data-segue-id";
const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

type MountFn = Box<dyn FnMut(&HtmlElement, &TransitionKey) -> Option<HtmlElement>>;
type WakeFn = Box<dyn FnMut()>;

#[derive(Default)]
struct Queue {
    events: VecDeque<HostEvent>,
    wake: Option<WakeFn>,
}

impl Queue {
    fn push(shared: &RefCell<Self>, event: HostEvent) {
        let wake = {
            let mut queue = shared.borrow_mut();
            queue.events.push_back(event);
            queue.wake.take()
        };
        // The wake hook runs without the borrow so it may drain right away.
        if let Some(mut wake) = wake {
            wake();
            let mut queue = shared.borrow_mut();
            if queue.wake.is_none() {
                queue.wake = Some(wake);
            }
        }
    }
}

struct Listener {
    element: HtmlElement,
    closure: Closure<dyn FnMut(TransitionEvent)>,
}

/// [`Host`] backed by live DOM elements.
pub struct WebHost {
    window: Window,
    registry: RefCell<Registry<HtmlElement>>,
    mount: MountFn,
    queue: Rc<RefCell<Queue>>,
    timers: FxHashMap<TimerId, (i32, Closure<dyn FnMut()>)>,
    frames: FxHashMap<FrameId, (i32, Closure<dyn FnMut(f64)>)>,
    listeners: FxHashMap<ListenerId, Listener>,
}

impl WebHost {
    /// Host on the current window. `mount` renders the content for a key
    /// into the given container and returns its root element.
    pub fn new(
        mount: impl FnMut(&HtmlElement, &TransitionKey) -> Option<HtmlElement>
            + 'static,
    ) -> Result<Self, SegueError> {
        let window = web_sys::window()
            .ok_or_else(|| SegueError::Host("no window".to_owned()))?;
        Ok(Self {
            window,
            registry: RefCell::new(Registry::default()),
            mount: Box::new(mount),
            queue: Rc::new(RefCell::new(Queue::default())),
            timers: FxHashMap::default(),
            frames: FxHashMap::default(),
            listeners: FxHashMap::default(),
        })
    }

    /// Called whenever a browser callback queued an event.
    pub fn on_wake(&mut self, f: impl FnMut() + 'static) {
        self.queue.borrow_mut().wake = Some(Box::new(f));
    }

    /// Identity for a DOM element, assigning one on first sight.
    pub fn register(&self, element: &HtmlElement) -> ElementId {
        let stamped = element
            .get_attribute(ID_ATTRIBUTE)
            .and_then(|raw| raw.parse().ok())
            .map(ElementId);
        let mut registry = self.registry.borrow_mut();
        if let Some(id) = registry.adopt(element, stamped) {
            return id;
        }
        let id = registry.insert(element.clone());
        drop(registry);
        let _ = element.set_attribute(ID_ATTRIBUTE, &id.0.to_string());
        id
    }

    /// DOM element behind an id.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<HtmlElement> {
        self.registry.borrow().get(id).cloned()
    }

    /// Forget elements no longer in the document.
    fn prune_detached(&self) {
        let pruned = self.registry.borrow_mut().prune(|el| el.is_connected());
        if pruned > 0 {
            log::debug!("pruned {pruned} detached elements");
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        let events: Vec<HostEvent> =
            self.queue.borrow_mut().events.drain(..).collect();
        // Callbacks that already ran are one-shot; drop their closures.
        for event in &events {
            match event {
                HostEvent::Timer(id) => {
                    let _ = self.timers.remove(id);
                }
                HostEvent::Frame(id) => {
                    let _ = self.frames.remove(id);
                }
                HostEvent::TransitionEnd { .. } => {}
            }
        }
        events
    }

    fn allocate(&self) -> u64 {
        self.registry.borrow_mut().allocate()
    }

    fn html_children(element: &Element) -> Vec<HtmlElement> {
        let children = element.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter_map(|child| child.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn descendants(element: &HtmlElement) -> Vec<HtmlElement> {
        let mut out = Vec::new();
        let mut stack: Vec<HtmlElement> =
            Self::html_children(element).into_iter().rev().collect();
        while let Some(el) = stack.pop() {
            stack.extend(Self::html_children(&el).into_iter().rev());
            out.push(el);
        }
        out
    }
}

impl Host for WebHost {
    fn prefers_reduced_motion(&self) -> bool {
        self.window
            .match_media(REDUCED_MOTION_QUERY)
            .ok()
            .flatten()
            .is_some_and(|query| query.matches())
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        let el = self.element(element)?;
        if !el.is_connected() {
            return None;
        }
        let rect = el.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn tracked_children(
        &self,
        container: ElementId,
        selector: &TrackSelector,
    ) -> Vec<ElementId> {
        self.prune_detached();
        let Some(root) = self.element(container) else {
            return Vec::new();
        };
        let found = match selector {
            TrackSelector::Children => Self::html_children(&root),
            TrackSelector::Marked(attr) => Self::descendants(&root)
                .into_iter()
                .filter(|el| el.has_attribute(attr))
                .collect(),
        };
        found.iter().map(|el| self.register(el)).collect()
    }

    fn animation_target(&self, host_element: ElementId) -> ElementId {
        let Some(el) = self.element(host_element) else {
            return host_element;
        };
        Self::descendants(&el)
            .iter()
            .find(|d| d.has_attribute(Marker::FlipTarget.attribute()))
            .map_or(host_element, |d| self.register(d))
    }

    fn style(&self, element: ElementId, prop: StyleProp) -> Option<String> {
        let value = self
            .element(element)?
            .style()
            .get_property_value(prop.css_name())
            .ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn set_style(&mut self, element: ElementId, prop: StyleProp, value: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.style().set_property(prop.css_name(), value);
        }
    }

    fn remove_style(&mut self, element: ElementId, prop: StyleProp) {
        if let Some(el) = self.element(element) {
            let _ = el.style().remove_property(prop.css_name());
        }
    }

    fn computed_transform(&self, element: ElementId) -> Option<String> {
        let el = self.element(element)?;
        let value = self
            .window
            .get_computed_style(&el)
            .ok()
            .flatten()?
            .get_property_value("transform")
            .ok()?;
        (!value.is_empty() && value != "none").then_some(value)
    }

    fn has_marker(&self, element: ElementId, marker: Marker) -> bool {
        self.element(element)
            .is_some_and(|el| el.has_attribute(marker.attribute()))
    }

    fn set_marker(&mut self, element: ElementId, marker: Marker) {
        if let Some(el) = self.element(element) {
            let _ = el.set_attribute(marker.attribute(), "");
        }
    }

    fn remove_marker(&mut self, element: ElementId, marker: Marker) {
        if let Some(el) = self.element(element) {
            let _ = el.remove_attribute(marker.attribute());
        }
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(el) = self.element(element) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn force_reflow(&mut self, element: ElementId) {
        if let Some(el) = self.element(element) {
            // Reading layout flushes pending style writes.
            let _ = el.offset_height();
        }
    }

    fn mount(
        &mut self,
        container: ElementId,
        key: &TransitionKey,
    ) -> Option<ElementId> {
        let parent = self.element(container)?;
        let child = (self.mount)(&parent, key)?;
        if child.parent_element().is_none() {
            let _ = parent.append_child(&child);
        }
        Some(self.register(&child))
    }

    fn unmount(&mut self, element: ElementId) {
        let removed = self.registry.borrow_mut().remove(element);
        if let Some(el) = removed {
            el.remove();
        }
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.allocate());
        let queue = Rc::clone(&self.queue);
        let closure: Closure<dyn FnMut()> = Closure::new(move || {
            Queue::push(&queue, HostEvent::Timer(id));
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                millis,
            ) {
            Ok(handle) => {
                let _ = self.timers.insert(id, (handle, closure));
            }
            Err(_) => log::warn!("setTimeout failed for {id}"),
        }
        id
    }

    fn clear_timeout(&mut self, timer: TimerId) {
        if let Some((handle, _closure)) = self.timers.remove(&timer) {
            self.window.clear_timeout_with_handle(handle);
        }
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.allocate());
        let queue = Rc::clone(&self.queue);
        let closure: Closure<dyn FnMut(f64)> =
            Closure::new(move |_timestamp: f64| {
                Queue::push(&queue, HostEvent::Frame(id));
            });
        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(handle) => {
                let _ = self.frames.insert(id, (handle, closure));
            }
            Err(_) => log::warn!("requestAnimationFrame failed for {id}"),
        }
        id
    }

    fn cancel_frame(&mut self, frame: FrameId) {
        if let Some((handle, _closure)) = self.frames.remove(&frame) {
            let _ = self.window.cancel_animation_frame(handle);
        }
    }

    fn listen_transition_end(&mut self, element: ElementId) -> ListenerId {
        let id = ListenerId(self.allocate());
        let Some(el) = self.element(element) else {
            return id;
        };
        let queue = Rc::clone(&self.queue);
        let target = el.clone();
        let closure: Closure<dyn FnMut(TransitionEvent)> =
            Closure::new(move |event: TransitionEvent| {
                // Bubbled events from descendants belong to someone else.
                let own = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlElement>().ok())
                    .is_some_and(|t| t == target);
                if own {
                    Queue::push(
                        &queue,
                        HostEvent::TransitionEnd {
                            element,
                            property: event.property_name(),
                        },
                    );
                }
            });
        let _ = el.add_event_listener_with_callback(
            "transitionend",
            closure.as_ref().unchecked_ref(),
        );
        let _ = self.listeners.insert(
            id,
            Listener {
                element: el,
                closure,
            },
        );
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        if let Some(Listener { element, closure }) =
            self.listeners.remove(&listener)
        {
            let _ = element.remove_event_listener_with_callback(
                "transitionend",
                closure.as_ref().unchecked_ref(),
            );
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        let timers: Vec<TimerId> = self.timers.keys().copied().collect();
        for timer in timers {
            self.clear_timeout(timer);
        }
        let frames: Vec<FrameId> = self.frames.keys().copied().collect();
        for frame in frames {
            self.cancel_frame(frame);
        }
        let listeners: Vec<ListenerId> = self.listeners.keys().copied().collect();
        for listener in listeners {
            self.unlisten(listener);
        }
    }
}

impl std::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebHost")
            .field("elements", &self.registry.borrow().len())
            .field("timers", &self.timers.len())
            .field("frames", &self.frames.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Route `log` output to the browser console and panics to `console.error`.
pub fn install_diagnostics() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}
