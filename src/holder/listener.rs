//! Event fan-out for load-balancer/visualization listeners (spec §4.3,
//! §5: "Listener vectors are appended-only during live operation; removal
//! zeroes a slot to keep indices stable").

use crate::index::Index;
use crate::types::NodeId;

/// An event fired by a [`crate::holder::Holder`] on element lifecycle
/// transitions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HolderEvent {
    Created,
    Destroyed,
    MigratedIn,
    MigratedOut,
}

/// A subscriber to holder lifecycle events. Out-of-scope collaborators
/// (load-balancer stats, visualization trace recorders) implement this;
/// the core only fans out.
pub trait HolderListener<Ix: Index>: Send {
    fn on_event(&mut self, event: HolderEvent, idx: &Ix, home_node: NodeId);
}

/// An append-only, slot-stable vector of listeners. `unsubscribe` zeroes
/// the slot rather than shifting later entries, so previously issued
/// [`ListenerHandle`]s stay valid.
#[derive(Default)]
pub struct ListenerSet<Ix: Index> {
    slots: Vec<Option<Box<dyn HolderListener<Ix>>>>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ListenerHandle(usize);

impl<Ix: Index> ListenerSet<Ix> {
    pub fn new() -> Self {
        ListenerSet { slots: Vec::new() }
    }

    pub fn subscribe(&mut self, listener: Box<dyn HolderListener<Ix>>) -> ListenerHandle {
        self.slots.push(Some(listener));
        ListenerHandle(self.slots.len() - 1)
    }

    pub fn unsubscribe(&mut self, handle: ListenerHandle) {
        if let Some(slot) = self.slots.get_mut(handle.0) {
            *slot = None;
        }
    }

    pub fn fire(&mut self, event: HolderEvent, idx: &Ix, home_node: NodeId) {
        for slot in self.slots.iter_mut().flatten() {
            slot.on_event(event, idx, home_node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index1D;

    struct CountingListener {
        count: usize,
        last_event: Option<HolderEvent>,
    }

    impl HolderListener<Index1D> for CountingListener {
        fn on_event(&mut self, event: HolderEvent, _idx: &Index1D, _home_node: NodeId) {
            self.count += 1;
            self.last_event = Some(event);
        }
    }

    #[test]
    fn unsubscribed_listener_stays_silent_but_handle_stable() {
        let mut set: ListenerSet<Index1D> = ListenerSet::new();
        let h1 = set.subscribe(Box::new(CountingListener {
            count: 0,
            last_event: None,
        }));
        let _h2 = set.subscribe(Box::new(CountingListener {
            count: 0,
            last_event: None,
        }));
        set.unsubscribe(h1);
        // firing after unsubscribe must not panic, and the second listener
        // still receives the event via its now-shifted-by-nothing slot.
        set.fire(HolderEvent::Created, &Index1D(0), 0);
        assert_eq!(set.slots.len(), 2);
    }
}
