//! The event-routing seam shared by every choreographer.

use crate::host::{Host, HostEvent};

/// Something that owns animation state on a host and reacts to its events.
///
/// The embedder routes every [`HostEvent`] to every live choreography; each
/// one claims only the timers, frames and listeners it registered itself.
pub trait Choreography<H: Host + ?Sized> {
    /// React to a host event. Returns `true` if the event belonged to this
    /// choreography.
    fn handle_event(&mut self, host: &mut H, event: &HostEvent) -> bool;

    /// Detach listeners, cancel timers and frames, and restore styles.
    /// Called when the owning component goes away.
    fn teardown(&mut self, host: &mut H);
}
