//! Finalize/watchdog protocol.
//!
//! A [`CompletionWatch`] decides when one animation pass is over. It is
//! armed over the set of animated elements and resolves exactly once, on
//! whichever of these comes first:
//!
//! - every element reported a native transition end for the animated
//!   property (other properties are ignored),
//! - the fallback timer at `duration + fallback_buffer` fired (an element was
//!   removed before its notification could arrive),
//! - the watchdog timer at `duration + watchdog_buffer` fired (the fallback
//!   itself was starved); this path also logs a warning,
//! - the owner forced it via [`settle`](CompletionWatch::settle).
//!
//! All paths share one `finalized` flag. Resolving also detaches every
//! listener and clears both timers.

use std::time::Duration;

use rustc_hash::FxHashSet;
use web_time::Instant;

use crate::host::{ElementId, Host, HostEvent, ListenerId, StyleProp, TimerId};
use crate::options::WatchdogOptions;

/// Why a pass finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalizeCause {
    /// Every animated element reported completion.
    Completed,
    /// The fallback timer fired first.
    Fallback,
    /// The watchdog timer fired first.
    Watchdog,
    /// A newer pass replaced this one.
    Superseded,
    /// The owner was torn down.
    Teardown,
}

/// What a watch made of one host event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Not ours, or arrived after finalize.
    Ignored,
    /// A completion for one of our elements; more are outstanding.
    Counted,
    /// This event finalized the pass.
    Finalized(FinalizeCause),
}

/// Completion tracking for one animation pass.
#[derive(Debug)]
pub struct CompletionWatch {
    property: StyleProp,
    elements: Vec<ElementId>,
    reported: FxHashSet<ElementId>,
    listeners: Vec<ListenerId>,
    fallback: TimerId,
    watchdog: TimerId,
    armed: bool,
    finalized: bool,
    started: Instant,
    duration: Duration,
}

impl CompletionWatch {
    /// Attach listeners to `elements` and start both timers.
    pub fn arm<H: Host + ?Sized>(
        host: &mut H,
        elements: &[ElementId],
        property: StyleProp,
        duration: Duration,
        options: &WatchdogOptions,
    ) -> Self {
        let listeners = elements
            .iter()
            .map(|&el| host.listen_transition_end(el))
            .collect();
        let fallback = host.set_timeout(duration + options.fallback_buffer());
        let watchdog = host.set_timeout(duration + options.watchdog_buffer());
        let mut unique = elements.to_vec();
        unique.sort_unstable();
        unique.dedup();
        Self {
            property,
            elements: unique,
            reported: FxHashSet::default(),
            listeners,
            fallback,
            watchdog,
            armed: true,
            finalized: false,
            started: Instant::now(),
            duration,
        }
    }

    /// Feed one host event.
    pub fn observe<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        event: &HostEvent,
    ) -> Observation {
        if self.finalized {
            return Observation::Ignored;
        }
        match event {
            HostEvent::TransitionEnd { element, property } => {
                if property != self.property.css_name()
                    || self.elements.binary_search(element).is_err()
                {
                    return Observation::Ignored;
                }
                let _ = self.reported.insert(*element);
                if self.reported.len() < self.elements.len() {
                    return Observation::Counted;
                }
                self.resolve(host, FinalizeCause::Completed)
            }
            HostEvent::Timer(id) if *id == self.fallback => {
                self.resolve(host, FinalizeCause::Fallback)
            }
            HostEvent::Timer(id) if *id == self.watchdog => {
                log::warn!(
                    "transition watchdog fired after {:?} (expected {:?}); \
                     {}/{} completion notification(s) arrived",
                    self.started.elapsed(),
                    self.duration,
                    self.reported.len(),
                    self.elements.len(),
                );
                self.resolve(host, FinalizeCause::Watchdog)
            }
            _ => Observation::Ignored,
        }
    }

    /// Force finalize from outside (supersede, teardown).
    ///
    /// Returns `None` if the watch had already finalized.
    pub fn settle<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        cause: FinalizeCause,
    ) -> Option<FinalizeCause> {
        match self.resolve(host, cause) {
            Observation::Finalized(cause) => Some(cause),
            _ => None,
        }
    }

    fn resolve<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        cause: FinalizeCause,
    ) -> Observation {
        if self.finalized {
            return Observation::Ignored;
        }
        self.finalized = true;
        self.disarm(host);
        log::debug!(
            "pass over {} element(s) finalized: {cause:?}",
            self.elements.len()
        );
        Observation::Finalized(cause)
    }

    /// Detach listeners and clear both timers. Idempotent.
    pub fn disarm<H: Host + ?Sized>(&mut self, host: &mut H) {
        if !self.armed {
            return;
        }
        self.armed = false;
        for listener in self.listeners.drain(..) {
            host.unlisten(listener);
        }
        host.clear_timeout(self.fallback);
        host.clear_timeout(self.watchdog);
    }

    /// Whether the pass is over.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Elements that have not reported completion yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.elements.len() - self.reported.len()
    }

    /// The fallback timer handle.
    #[must_use]
    pub fn fallback_timer(&self) -> TimerId {
        self.fallback
    }

    /// The watchdog timer handle.
    #[must_use]
    pub fn watchdog_timer(&self) -> TimerId {
        self.watchdog
    }
}
