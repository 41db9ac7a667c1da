//! Keyed class-lifecycle swap for fade-only routes.
//!
//! Exactly one content node is mounted per key. On a key change the old
//! node gets `<name>-exit` and `<name>-exit-active`, the new node gets
//! `<name>-enter`, a reflow commits it, then `<name>-enter-active` starts
//! the stylesheet's transition. After the effective duration the exit node
//! unmounts and the enter classes come off. The published transition kind
//! is cleared at the same moment.

use super::choreography::Choreography;
use super::motion::resolve_duration;
use super::navigation::TransitionKey;
use super::store::{TransitionKind, TransitionReader, TransitionStore};
use crate::host::{ElementId, Host, HostEvent, TimerId};
use crate::options::{FadeOptions, WatchdogOptions};

/// What [`FadeSwitch::switch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// First content in the slot; mounted without classes.
    Mounted,
    /// Same key; only the published kind was refreshed.
    Refreshed,
    /// Content swapped without fading.
    Swapped,
    /// A fade started.
    Fading,
}

#[derive(Debug)]
struct FadeExit {
    exit: ElementId,
    enter: ElementId,
    timer: TimerId,
}

/// Fade adapter for one content slot.
#[derive(Debug)]
pub struct FadeSwitch {
    container: ElementId,
    options: FadeOptions,
    watchdog: WatchdogOptions,
    store: TransitionStore,
    current: Option<(TransitionKey, ElementId)>,
    exit: Option<FadeExit>,
    clear_timer: Option<TimerId>,
}

impl FadeSwitch {
    /// Adapter for `container`, publishing into `store`.
    #[must_use]
    pub fn new(
        container: ElementId,
        options: FadeOptions,
        watchdog: WatchdogOptions,
        store: TransitionStore,
    ) -> Self {
        Self {
            container,
            options,
            watchdog,
            store,
            current: None,
            exit: None,
            clear_timer: None,
        }
    }

    /// Key and element currently mounted.
    #[must_use]
    pub fn current(&self) -> Option<(&TransitionKey, ElementId)> {
        self.current.as_ref().map(|(k, el)| (k, *el))
    }

    /// Whether an exit node is still mounted.
    #[must_use]
    pub fn is_exiting(&self) -> bool {
        self.exit.is_some()
    }

    /// Read handle on the published state.
    #[must_use]
    pub fn reader(&self) -> TransitionReader {
        self.store.reader()
    }

    /// Show `key`, fading from the current content when there is some.
    pub fn switch<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        key: TransitionKey,
        kind: TransitionKind,
    ) -> SwitchOutcome {
        let duration =
            resolve_duration(host, self.options.duration(), self.options.disabled);

        if self.current.as_ref().is_some_and(|(k, _)| *k == key) {
            // The stable key keeps the node mounted, so no exit will ever
            // clear the kind. Clear it explicitly later.
            if let Some(timer) = self.clear_timer.take() {
                host.clear_timeout(timer);
            }
            if !duration.is_zero() {
                self.store.update(|s| s.kind = Some(kind));
                self.clear_timer = Some(
                    host.set_timeout(duration + self.watchdog.watchdog_buffer()),
                );
            }
            return SwitchOutcome::Refreshed;
        }

        self.complete_exit(host);

        let Some((_, old)) = self.current.take() else {
            self.current = host
                .mount(self.container, &key)
                .map(|el| (key.clone(), el));
            self.store.update(|s| s.key = Some(key));
            return SwitchOutcome::Mounted;
        };

        if duration.is_zero() {
            host.unmount(old);
            self.current = host
                .mount(self.container, &key)
                .map(|el| (key.clone(), el));
            self.store.update(|s| {
                s.key = Some(key);
                s.kind = None;
            });
            return SwitchOutcome::Swapped;
        }

        let Some(enter) = host.mount(self.container, &key) else {
            log::warn!("mounting {key} failed, dropping the old content");
            host.unmount(old);
            self.store.update(|s| {
                s.key = Some(key);
                s.kind = None;
            });
            return SwitchOutcome::Swapped;
        };

        host.add_class(old, &self.options.class("exit"));
        host.add_class(old, &self.options.class("exit-active"));
        host.add_class(enter, &self.options.class("enter"));
        host.force_reflow(enter);
        host.add_class(enter, &self.options.class("enter-active"));

        self.store.update(|s| {
            s.key = Some(key.clone());
            s.kind = Some(kind);
        });
        log::debug!("fading to {key} over {duration:?}");
        self.exit = Some(FadeExit {
            exit: old,
            enter,
            timer: host.set_timeout(duration),
        });
        self.current = Some((key, enter));
        SwitchOutcome::Fading
    }

    /// Finish an in-flight exit now.
    fn complete_exit<H: Host + ?Sized>(&mut self, host: &mut H) {
        let Some(exit) = self.exit.take() else {
            return;
        };
        host.clear_timeout(exit.timer);
        host.unmount(exit.exit);
        host.remove_class(exit.enter, &self.options.class("enter"));
        host.remove_class(exit.enter, &self.options.class("enter-active"));
        self.clear_kind(host);
    }

    fn clear_kind<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(timer) = self.clear_timer.take() {
            host.clear_timeout(timer);
        }
        self.store.update(|s| s.kind = None);
    }
}

impl<H: Host + ?Sized> Choreography<H> for FadeSwitch {
    fn handle_event(&mut self, host: &mut H, event: &HostEvent) -> bool {
        let HostEvent::Timer(id) = event else {
            return false;
        };
        if self.exit.as_ref().is_some_and(|e| e.timer == *id) {
            self.complete_exit(host);
            return true;
        }
        if self.clear_timer == Some(*id) {
            self.clear_timer = None;
            self.clear_kind(host);
            return true;
        }
        false
    }

    fn teardown(&mut self, host: &mut H) {
        self.complete_exit(host);
        self.clear_kind(host);
    }
}
