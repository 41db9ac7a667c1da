//! Navigation identity: transition keys and latched slide directions.

use std::fmt;
use std::rc::Rc;

/// Opaque identity of what is mounted in a content slot.
///
/// A new navigation produces a new key; handing a choreographer the key it
/// already shows is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionKey(Rc<str>);

impl TransitionKey {
    /// Key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Rc::from(key.as_ref()))
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransitionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Which way content slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// New content enters from the right, old content leaves to the left.
    #[default]
    Forward,
    /// New content enters from the left, old content leaves to the right.
    Backward,
}

impl Direction {
    /// `+1` forward, `-1` backward.
    #[must_use]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Signals available at navigation time for deriving a [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationIntent {
    /// Direction requested explicitly by the caller (e.g. a "back" button).
    pub explicit: Option<Direction>,
    /// Position in the session history, when the router exposes it.
    pub history_index: Option<usize>,
}

impl NavigationIntent {
    /// Intent carrying only an explicit direction.
    #[must_use]
    pub fn explicit(direction: Direction) -> Self {
        Self {
            explicit: Some(direction),
            history_index: None,
        }
    }

    /// Intent carrying only a history index.
    #[must_use]
    pub fn at_history_index(index: usize) -> Self {
        Self {
            explicit: None,
            history_index: Some(index),
        }
    }
}

/// Resolves a direction once per key and keeps it.
///
/// The signals that produced a direction are often transient (an intent flag
/// cleared right after navigation, a history index that moves again), so
/// asking twice for the same key always returns the first answer.
#[derive(Debug, Clone, Default)]
pub struct DirectionLatch {
    latched: Option<(TransitionKey, Direction)>,
    last_history_index: Option<usize>,
}

impl DirectionLatch {
    /// Empty latch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Direction for `key`, computing and latching it on first sight.
    ///
    /// Priority: explicit intent, then history index movement (a lower index
    /// than the previous one is backward), then forward.
    pub fn resolve(
        &mut self,
        key: &TransitionKey,
        intent: NavigationIntent,
    ) -> Direction {
        if let Some((latched_key, direction)) = &self.latched {
            if latched_key == key {
                return *direction;
            }
        }

        let from_history = match (intent.history_index, self.last_history_index)
        {
            (Some(now), Some(before)) if now < before => {
                Some(Direction::Backward)
            }
            (Some(_), Some(_)) => Some(Direction::Forward),
            _ => None,
        };
        let direction = intent
            .explicit
            .or(from_history)
            .unwrap_or(Direction::Forward);

        if let Some(index) = intent.history_index {
            self.last_history_index = Some(index);
        }
        self.latched = Some((key.clone(), direction));
        direction
    }

    /// Direction latched for the most recent key.
    #[must_use]
    pub fn current(&self) -> Option<Direction> {
        self.latched.as_ref().map(|(_, d)| *d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_identity() {
        let a = TransitionKey::new("/quiz/1");
        assert_eq!(a, TransitionKey::from("/quiz/1"));
        assert_ne!(a, TransitionKey::new("/quiz/2"));
        assert_eq!(a.to_string(), "/quiz/1");
    }

    #[test]
    fn test_sign() {
        assert_eq!(Direction::Forward.sign(), 1);
        assert_eq!(Direction::Backward.sign(), -1);
    }

    #[test]
    fn test_explicit_intent_wins() {
        let mut latch = DirectionLatch::new();
        let _ = latch.resolve(&"a".into(), NavigationIntent::at_history_index(3));
        let intent = NavigationIntent {
            explicit: Some(Direction::Backward),
            history_index: Some(4),
        };
        assert_eq!(latch.resolve(&"b".into(), intent), Direction::Backward);
    }

    #[test]
    fn test_history_index_decrease_is_backward() {
        let mut latch = DirectionLatch::new();
        let first =
            latch.resolve(&"a".into(), NavigationIntent::at_history_index(2));
        assert_eq!(first, Direction::Forward);
        let back =
            latch.resolve(&"b".into(), NavigationIntent::at_history_index(1));
        assert_eq!(back, Direction::Backward);
        let fwd =
            latch.resolve(&"c".into(), NavigationIntent::at_history_index(2));
        assert_eq!(fwd, Direction::Forward);
    }

    #[test]
    fn test_direction_latched_after_intent_cleared() {
        let mut latch = DirectionLatch::new();
        let key = TransitionKey::new("/result");
        let d = latch.resolve(&key, NavigationIntent::explicit(Direction::Backward));
        assert_eq!(d, Direction::Backward);
        // The intent signal is gone on the next render, the key is the same.
        let again = latch.resolve(&key, NavigationIntent::default());
        assert_eq!(again, Direction::Backward);
        assert_eq!(latch.current(), Some(Direction::Backward));
    }
}
