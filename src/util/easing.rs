//! Easing curves for transitions.
//!
//! Every curve renders to a CSS timing function via [`Easing::to_css`] so
//! DOM-backed hosts can hand it straight to `transition`. Hosts that drive
//! motion themselves can sample the same curve with [`Easing::evaluate`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Newton iterations before falling back to bisection.
const NEWTON_ITERATIONS: usize = 8;
/// Bisection iterations for the fallback solver.
const BISECTION_ITERATIONS: usize = 32;
/// Solver tolerance on the x axis.
const EPSILON: f64 = 1e-7;

/// Easing curve variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// CSS `ease`.
    Ease,
    /// CSS `ease-in` (slow start).
    EaseIn,
    /// CSS `ease-out` (slow end).
    EaseOut,
    /// CSS `ease-in-out`.
    EaseInOut,
    /// Raw cubic Bézier with control points `(x1, y1)` and `(x2, y2)`.
    CubicBezier {
        /// First control point x (clamped to `[0, 1]` when sampled).
        x1: f64,
        /// First control point y.
        y1: f64,
        /// Second control point x (clamped to `[0, 1]` when sampled).
        x2: f64,
        /// Second control point y.
        y2: f64,
    },
}

impl Easing {
    /// Default curve: a decelerating "emphasized" ease-out.
    pub const DEFAULT: Easing = Easing::CubicBezier {
        x1: 0.2,
        y1: 0.0,
        x2: 0.0,
        y2: 1.0,
    };

    /// CSS timing function for this curve.
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Easing::Linear => "linear".to_owned(),
            Easing::Ease => "ease".to_owned(),
            Easing::EaseIn => "ease-in".to_owned(),
            Easing::EaseOut => "ease-out".to_owned(),
            Easing::EaseInOut => "ease-in-out".to_owned(),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                format!("cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        }
    }

    /// Control points of the equivalent cubic Bézier, `None` for linear.
    fn control_points(&self) -> Option<(f64, f64, f64, f64)> {
        match *self {
            Easing::Linear => None,
            Easing::Ease => Some((0.25, 0.1, 0.25, 1.0)),
            Easing::EaseIn => Some((0.42, 0.0, 1.0, 1.0)),
            Easing::EaseOut => Some((0.0, 0.0, 0.58, 1.0)),
            Easing::EaseInOut => Some((0.42, 0.0, 0.58, 1.0)),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                Some((x1.clamp(0.0, 1.0), y1, x2.clamp(0.0, 1.0), y2))
            }
        }
    }

    /// Evaluate the curve at progress `t`.
    ///
    /// Input is clamped to `[0, 1]`; non-finite input yields `1.0` so a
    /// broken clock snaps to the end state instead of freezing mid-way.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> f64 {
        if !t.is_finite() {
            return 1.0;
        }
        let t = t.clamp(0.0, 1.0);
        let Some((x1, y1, x2, y2)) = self.control_points() else {
            return t;
        };
        if t == 0.0 || t == 1.0 {
            return t;
        }
        let s = solve_for_x(t, x1, x2);
        bezier(s, y1, y2)
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One axis of a cubic Bézier anchored at 0 and 1.
fn bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_slope(s: f64, p1: f64, p2: f64) -> f64 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Parameter `s` at which the curve's x equals `x`.
fn solve_for_x(x: f64, x1: f64, x2: f64) -> f64 {
    let mut s = x;
    for _ in 0..NEWTON_ITERATIONS {
        let err = bezier(s, x1, x2) - x;
        if err.abs() < EPSILON {
            return s;
        }
        let slope = bezier_slope(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..BISECTION_ITERATIONS {
        let value = bezier(s, x1, x2);
        if (value - x).abs() < EPSILON {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_names() {
        assert_eq!(Easing::Linear.to_css(), "linear");
        assert_eq!(Easing::EaseInOut.to_css(), "ease-in-out");
        assert_eq!(Easing::DEFAULT.to_css(), "cubic-bezier(0.2, 0, 0, 1)");
    }

    #[test]
    fn test_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::Ease,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::DEFAULT,
        ] {
            assert_eq!(easing.evaluate(0.0), 0.0, "{easing:?} at 0");
            assert!((easing.evaluate(1.0) - 1.0).abs() < 1e-9, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_ease_out_leads_linear() {
        let v = Easing::EaseOut.evaluate(0.25);
        assert!(v > 0.25, "ease-out should lead linear at t=0.25, got {v}");
        let v = Easing::EaseIn.evaluate(0.25);
        assert!(v < 0.25, "ease-in should trail linear at t=0.25, got {v}");
    }

    #[test]
    fn test_symmetric_midpoint() {
        assert!((Easing::EaseInOut.evaluate(0.5) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_input_clamping_and_nan() {
        assert_eq!(Easing::Linear.evaluate(-0.5), 0.0);
        assert_eq!(Easing::Linear.evaluate(1.5), 1.0);
        assert_eq!(Easing::Ease.evaluate(f64::NAN), 1.0);
    }

    #[test]
    fn test_default_is_emphasized_curve() {
        assert_eq!(Easing::default(), Easing::DEFAULT);
    }
}
