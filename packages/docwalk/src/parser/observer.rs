//! Observer trait definition.

use crate::event::NodeEvent;

/// Receives every node event of a traversal, in registration order.
///
/// Observers get the event by `&mut` for one dispatch only and may call
/// [`NodeEvent::set_skip`] or [`NodeEvent::set_cancel`]. Any
/// `FnMut(&mut NodeEvent)` closure is an observer; state the closure
/// captures lives as long as the closure.
pub trait Observer {
    /// Handle one node event.
    fn on_node(&mut self, event: &mut NodeEvent);

    /// Whether this observer still receives an event after an earlier
    /// observer skipped it.
    ///
    /// Default is `false`. Observers returning `true` see the skipped event
    /// itself (with [`NodeEvent::is_skipped`] set) but never its subtree.
    fn sees_skipped(&self) -> bool {
        false
    }
}

impl<F> Observer for F
where
    F: FnMut(&mut NodeEvent),
{
    fn on_node(&mut self, event: &mut NodeEvent) {
        self(event);
    }
}
