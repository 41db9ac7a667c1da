//! The UI host seam.
//!
//! Choreographers never touch a DOM directly. They talk to a [`Host`], which
//! exposes geometry queries, a closed set of inline style properties,
//! marker attributes, timers, animation frames and transition-end
//! listeners. Asynchronous happenings come back as [`HostEvent`]s which the
//! embedder routes to every [`Choreography`](crate::animation::Choreography).
//!
//! - [`SimHost`]: deterministic in-memory host used by tests and the replay
//!   binary.
//! - `WebHost` (feature `web`): real DOM elements through `web-sys`.

#[cfg(any(feature = "web", test))]
mod registry;
pub mod sim;
#[cfg(feature = "web")]
pub mod web;

use std::fmt;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use sim::SimHost;

use crate::animation::TransitionKey;
use crate::geometry::Rect;
use crate::util::easing::Easing;

macro_rules! handle_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle_id!(
    /// Host-assigned identity of a UI element.
    ElementId
);
handle_id!(
    /// Handle returned by [`Host::set_timeout`].
    TimerId
);
handle_id!(
    /// Handle returned by [`Host::request_frame`].
    FrameId
);
handle_id!(
    /// Handle returned by [`Host::listen_transition_end`].
    ListenerId
);

/// Inline style properties a choreography may own during a pass.
///
/// Every other property belongs to the declarative layer. Ownership of
/// these is released at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleProp {
    /// `transform`
    Transform,
    /// `transition`
    Transition,
    /// `animation`
    Animation,
    /// `position`
    Position,
    /// `top`
    Top,
    /// `left`
    Left,
    /// `width`
    Width,
    /// `height`
    Height,
    /// `will-change`
    WillChange,
}

impl StyleProp {
    /// Properties written while a layer is promoted to overlay positioning.
    pub const OVERLAY: [StyleProp; 5] = [
        StyleProp::Position,
        StyleProp::Top,
        StyleProp::Left,
        StyleProp::Width,
        StyleProp::WillChange,
    ];

    /// CSS property name.
    #[must_use]
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProp::Transform => "transform",
            StyleProp::Transition => "transition",
            StyleProp::Animation => "animation",
            StyleProp::Position => "position",
            StyleProp::Top => "top",
            StyleProp::Left => "left",
            StyleProp::Width => "width",
            StyleProp::Height => "height",
            StyleProp::WillChange => "will-change",
        }
    }
}

/// Marker attributes a choreography may set on elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marker {
    /// Motion is allowed inside this container for the current pass.
    MotionAllowed,
    /// The inner element that receives FLIP transforms instead of its host.
    FlipTarget,
    /// The element is currently an overlay layer.
    OverlayLayer,
}

impl Marker {
    /// Attribute name carried in the DOM.
    #[must_use]
    pub fn attribute(self) -> &'static str {
        match self {
            Marker::MotionAllowed => "data-motion-allowed",
            Marker::FlipTarget => "data-flip-target",
            Marker::OverlayLayer => "data-overlay-layer",
        }
    }
}

/// Which descendants of a container are tracked by a FLIP engine.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TrackSelector {
    /// Direct children of the container.
    #[default]
    Children,
    /// Descendants carrying the given attribute.
    Marked(String),
}

/// Something asynchronous the host observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A timer registered with [`Host::set_timeout`] elapsed.
    Timer(TimerId),
    /// A frame requested with [`Host::request_frame`] is being rendered.
    Frame(FrameId),
    /// A CSS transition finished on a listened element.
    TransitionEnd {
        /// Element the transition ran on.
        element: ElementId,
        /// CSS name of the property that finished transitioning.
        property: String,
    },
}

/// Retained-mode UI host.
///
/// All methods run on the UI thread; none of them block. Methods taking an
/// [`ElementId`] that no longer resolves must be no-ops (or return `None`),
/// never panics.
pub trait Host {
    /// Live "prefers reduced motion" signal. Queried per use, never cached.
    fn prefers_reduced_motion(&self) -> bool;

    /// Bounding rectangle in viewport coordinates.
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;

    /// Tracked descendants of `container`, in document order.
    fn tracked_children(
        &self,
        container: ElementId,
        selector: &TrackSelector,
    ) -> Vec<ElementId>;

    /// Element that receives transforms for a tracked host element.
    ///
    /// This is the first descendant carrying [`Marker::FlipTarget`], or the
    /// host itself.
    fn animation_target(&self, host_element: ElementId) -> ElementId;

    /// Current inline value of a style property.
    fn style(&self, element: ElementId, prop: StyleProp) -> Option<String>;

    /// Write an inline style property.
    fn set_style(&mut self, element: ElementId, prop: StyleProp, value: &str);

    /// Remove an inline style property.
    fn remove_style(&mut self, element: ElementId, prop: StyleProp);

    /// Computed (not inline) transform, `None` when it is `none`.
    fn computed_transform(&self, element: ElementId) -> Option<String>;

    /// Whether the marker attribute is present.
    fn has_marker(&self, element: ElementId, marker: Marker) -> bool;

    /// Set a marker attribute.
    fn set_marker(&mut self, element: ElementId, marker: Marker);

    /// Remove a marker attribute.
    fn remove_marker(&mut self, element: ElementId, marker: Marker);

    /// Add a CSS class.
    fn add_class(&mut self, element: ElementId, class: &str);

    /// Remove a CSS class.
    fn remove_class(&mut self, element: ElementId, class: &str);

    /// Force a synchronous layout so pending style writes are committed.
    fn force_reflow(&mut self, element: ElementId);

    /// Mount the content for `key` inside `container`.
    fn mount(
        &mut self,
        container: ElementId,
        key: &TransitionKey,
    ) -> Option<ElementId>;

    /// Remove an element from the tree.
    fn unmount(&mut self, element: ElementId);

    /// Schedule a [`HostEvent::Timer`] after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> TimerId;

    /// Cancel a pending timer. Unknown ids are ignored.
    fn clear_timeout(&mut self, timer: TimerId);

    /// Schedule a [`HostEvent::Frame`] before the next paint.
    fn request_frame(&mut self) -> FrameId;

    /// Cancel a pending frame. Unknown ids are ignored.
    fn cancel_frame(&mut self, frame: FrameId);

    /// Start delivering [`HostEvent::TransitionEnd`] for `element`.
    fn listen_transition_end(&mut self, element: ElementId) -> ListenerId;

    /// Stop a transition-end listener. Unknown ids are ignored.
    fn unlisten(&mut self, listener: ListenerId);
}

/// CSS `transition` value animating a single property.
#[must_use]
pub fn css_transition(
    prop: StyleProp,
    duration: Duration,
    easing: &Easing,
) -> String {
    format!(
        "{} {}ms {}",
        prop.css_name(),
        duration.as_millis(),
        easing.to_css()
    )
}

/// Put back an inline value captured before a pass, removing the property
/// when it was absent.
pub fn restore_style<H: Host + ?Sized>(
    host: &mut H,
    element: ElementId,
    prop: StyleProp,
    prior: Option<&str>,
) {
    match prior {
        Some(value) => host.set_style(element, prop, value),
        None => host.remove_style(element, prop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_names_are_kebab_case() {
        assert_eq!(StyleProp::WillChange.css_name(), "will-change");
        assert_eq!(StyleProp::Transform.css_name(), "transform");
        assert_eq!(Marker::FlipTarget.attribute(), "data-flip-target");
    }

    #[test]
    fn test_transition_value() {
        let value = css_transition(
            StyleProp::Transform,
            Duration::from_millis(250),
            &Easing::EaseOut,
        );
        assert_eq!(value, "transform 250ms ease-out");
    }

    #[test]
    fn test_restore_style_round_trip() {
        let mut host = SimHost::new();
        let el = host.create_root(Rect::new(0.0, 0.0, 10.0, 10.0));
        host.set_style(el, StyleProp::Transform, "scale(2)");
        restore_style(&mut host, el, StyleProp::Transform, Some("rotate(1deg)"));
        assert_eq!(
            host.inline_style(el, StyleProp::Transform),
            Some("rotate(1deg)")
        );
        restore_style(&mut host, el, StyleProp::Transform, None);
        assert!(!host.has_inline_styles(el));
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(ElementId(3).to_string(), "ElementId#3");
        assert_eq!(TimerId(9).to_string(), "TimerId#9");
    }
}
