//! Accessibility and timing policy.
//!
//! Every duration a choreographer uses goes through [`resolve_duration`],
//! which consults the host's live reduced-motion signal on each call. The
//! preference can flip while the app is running (OS settings), so the
//! result is never cached.

use std::time::Duration;

use crate::host::Host;

/// Longest motion allowed while the user prefers reduced motion.
pub const REDUCED_MOTION_CAP: Duration = Duration::from_millis(100);

/// Duration to actually animate for, given the reduced-motion preference.
///
/// Reduced motion caps the request at [`REDUCED_MOTION_CAP`] rather than
/// disabling motion outright; otherwise the request passes through.
#[must_use]
pub fn effective_duration(requested: Duration, reduced_motion: bool) -> Duration {
    if reduced_motion {
        requested.min(REDUCED_MOTION_CAP)
    } else {
        requested
    }
}

/// [`effective_duration`] against the host's live preference.
///
/// `disabled` forces zero, which every choreographer treats as "settle
/// immediately without touching styles".
#[must_use]
pub fn resolve_duration<H: Host + ?Sized>(
    host: &H,
    requested: Duration,
    disabled: bool,
) -> Duration {
    if disabled {
        return Duration::ZERO;
    }
    effective_duration(requested, host.prefers_reduced_motion())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SimHost;

    #[test]
    fn test_reduced_motion_clamps() {
        let requested = Duration::from_millis(500);
        assert!(effective_duration(requested, true) <= REDUCED_MOTION_CAP);
        assert_eq!(effective_duration(requested, false), requested);
    }

    #[test]
    fn test_short_durations_pass_through_clamp() {
        let requested = Duration::from_millis(40);
        assert_eq!(effective_duration(requested, true), requested);
        assert_eq!(effective_duration(Duration::ZERO, true), Duration::ZERO);
    }

    #[test]
    fn test_resolution_follows_live_preference() {
        let mut host = SimHost::new();
        let requested = Duration::from_millis(300);
        assert_eq!(resolve_duration(&host, requested, false), requested);

        host.set_reduced_motion(true);
        assert_eq!(
            resolve_duration(&host, requested, false),
            REDUCED_MOTION_CAP
        );

        host.set_reduced_motion(false);
        assert_eq!(resolve_duration(&host, requested, false), requested);
        assert_eq!(resolve_duration(&host, requested, true), Duration::ZERO);
    }
}
