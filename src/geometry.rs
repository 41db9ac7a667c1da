//! Layout rectangles and FLIP offsets.

use glam::DVec2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Distance from the viewport's left edge.
    pub left: f64,
    /// Distance from the viewport's top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Rectangle from origin and size.
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> DVec2 {
        DVec2::new(self.left, self.top)
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        DVec2::new(
            self.left + self.width * 0.5,
            self.top + self.height * 0.5,
        )
    }

    /// Same size, moved to a new origin.
    #[must_use]
    pub fn moved_to(self, left: f64, top: f64) -> Self {
        Self { left, top, ..self }
    }
}

/// Axis a FLIP animation may be restricted to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Horizontal motion only.
    X,
    /// Vertical motion only.
    Y,
}

/// Inverted offset that places an element at its previous position.
///
/// Returns `None` when a coordinate on an animated axis is non-finite, in
/// which case the caller snaps instead of animating. The locked-out axis is
/// never inspected.
#[must_use]
pub fn flip_offset(
    previous: &Rect,
    current: &Rect,
    lock_axis: Option<Axis>,
) -> Option<DVec2> {
    let delta = previous.origin() - current.origin();
    let offset = match lock_axis {
        Some(Axis::X) => DVec2::new(delta.x, 0.0),
        Some(Axis::Y) => DVec2::new(0.0, delta.y),
        None => delta,
    };
    offset.is_finite().then_some(offset)
}

/// CSS translation for an offset in pixels.
#[must_use]
pub fn css_translate(offset: DVec2) -> String {
    format!("translate({}px, {}px)", offset.x, offset.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_previous_minus_current() {
        let prev = Rect::new(0.0, 0.0, 100.0, 40.0);
        let cur = Rect::new(10.0, 50.0, 100.0, 40.0);
        let offset = flip_offset(&prev, &cur, None).unwrap();
        assert_eq!(offset, DVec2::new(-10.0, -50.0));
    }

    #[test]
    fn test_axis_lock_zeroes_other_axis() {
        let prev = Rect::new(0.0, 0.0, 10.0, 10.0);
        let cur = Rect::new(5.0, 7.0, 10.0, 10.0);
        assert_eq!(
            flip_offset(&prev, &cur, Some(Axis::X)),
            Some(DVec2::new(-5.0, 0.0))
        );
        assert_eq!(
            flip_offset(&prev, &cur, Some(Axis::Y)),
            Some(DVec2::new(0.0, -7.0))
        );
    }

    #[test]
    fn test_non_finite_snaps() {
        let prev = Rect::new(f64::NAN, 0.0, 10.0, 10.0);
        let cur = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(flip_offset(&prev, &cur, None).is_none());
        assert!(flip_offset(&prev, &cur, Some(Axis::X)).is_none());
    }

    #[test]
    fn test_non_finite_on_locked_out_axis_still_animates() {
        let prev = Rect::new(f64::NAN, 0.0, 10.0, 10.0);
        let cur = Rect::new(0.0, 30.0, 10.0, 10.0);
        assert_eq!(
            flip_offset(&prev, &cur, Some(Axis::Y)),
            Some(DVec2::new(0.0, -30.0))
        );
    }

    #[test]
    fn test_css_translate_format() {
        assert_eq!(
            css_translate(DVec2::new(0.0, -50.0)),
            "translate(0px, -50px)"
        );
        assert_eq!(css_translate(DVec2::new(2.5, 50.0)), "translate(2.5px, 50px)");
    }

    #[test]
    fn test_center() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.center(), DVec2::new(60.0, 45.0));
        assert_eq!(r.moved_to(0.0, 0.0).center(), DVec2::new(50.0, 25.0));
    }
}
