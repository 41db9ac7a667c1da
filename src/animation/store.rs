//! Observable "current transition" state.
//!
//! A slot's choreographer owns the only [`TransitionStore`] (the writer);
//! unrelated UI such as a progress indicator or a scroll-lock controller
//! holds [`TransitionReader`] handles. Everything is single-threaded.

use std::cell::RefCell;
use std::rc::Rc;

use super::navigation::{Direction, TransitionKey};

/// Coarse phase of a content slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionPhase {
    /// Nothing has animated yet.
    #[default]
    Idle,
    /// A two-layer animation is in flight.
    Overlay,
    /// One layer, normal flow.
    Settled,
}

/// Kind of transition currently playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Cross-fade via CSS classes.
    Fade,
    /// Horizontal slide in the given direction.
    Slide(Direction),
}

/// Snapshot handed to readers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionState {
    /// Current phase.
    pub phase: TransitionPhase,
    /// Kind while a transition plays, `None` otherwise.
    pub kind: Option<TransitionKind>,
    /// Key currently mounted (or being entered).
    pub key: Option<TransitionKey>,
}

/// Handle returned by [`TransitionReader::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&TransitionState)>;

#[derive(Default)]
struct Shared {
    state: TransitionState,
    next_subscription: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    notifying: bool,
    unsubscribed: Vec<SubscriptionId>,
}

/// Single writer of a slot's [`TransitionState`].
///
/// Deliberately not `Clone`: only the owning choreographer publishes.
pub struct TransitionStore {
    shared: Rc<RefCell<Shared>>,
}

/// Read-only view of a [`TransitionStore`]. Cheap to clone.
#[derive(Clone)]
pub struct TransitionReader {
    shared: Rc<RefCell<Shared>>,
}

impl Default for TransitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionStore {
    /// Store in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    /// A new reader handle.
    #[must_use]
    pub fn reader(&self) -> TransitionReader {
        TransitionReader {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Current state.
    #[must_use]
    pub fn get(&self) -> TransitionState {
        self.shared.borrow().state.clone()
    }

    /// Replace the whole state and notify subscribers if it changed.
    pub fn publish(&self, state: TransitionState) {
        {
            let mut shared = self.shared.borrow_mut();
            if shared.state == state {
                return;
            }
            shared.state = state;
        }
        self.notify();
    }

    /// Update part of the state in place.
    pub fn update(&self, f: impl FnOnce(&mut TransitionState)) {
        let mut next = self.get();
        f(&mut next);
        self.publish(next);
    }

    fn notify(&self) {
        // Subscribers are taken out while they run so one of them may
        // subscribe, unsubscribe or read without a double borrow.
        let (state, mut subscribers) = {
            let mut shared = self.shared.borrow_mut();
            shared.notifying = true;
            (
                shared.state.clone(),
                std::mem::take(&mut shared.subscribers),
            )
        };
        for (_, subscriber) in &mut subscribers {
            subscriber(&state);
        }
        let mut shared = self.shared.borrow_mut();
        shared.notifying = false;
        let added = std::mem::replace(&mut shared.subscribers, subscribers);
        shared.subscribers.extend(added);
        let removed = std::mem::take(&mut shared.unsubscribed);
        shared.subscribers.retain(|(id, _)| !removed.contains(id));
    }
}

impl TransitionReader {
    /// Current state.
    #[must_use]
    pub fn get(&self) -> TransitionState {
        self.shared.borrow().state.clone()
    }

    /// Whether a transition kind is currently published.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        let shared = self.shared.borrow();
        shared.state.kind.is_some()
            || shared.state.phase == TransitionPhase::Overlay
    }

    /// Call `f` with every future state change.
    pub fn subscribe(
        &self,
        f: impl FnMut(&TransitionState) + 'static,
    ) -> SubscriptionId {
        let mut shared = self.shared.borrow_mut();
        shared.next_subscription += 1;
        let id = SubscriptionId(shared.next_subscription);
        shared.subscribers.push((id, Box::new(f)));
        id
    }

    /// Stop notifications for `id`. Unknown ids are ignored.
    ///
    /// Unsubscribing from inside a callback takes effect from the next
    /// change on.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut shared = self.shared.borrow_mut();
        if shared.notifying {
            shared.unsubscribed.push(id);
        }
        shared.subscribers.retain(|(sub, _)| *sub != id);
    }
}

impl std::fmt::Debug for TransitionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionStore")
            .field("state", &self.shared.borrow().state)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TransitionReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionReader")
            .field("state", &self.shared.borrow().state)
            .finish_non_exhaustive()
    }
}
