//! Replaces virtual dispatch through template handlers (spec §9): a plain
//! map from `handler_id` to a boxed closure that deserializes a payload and
//! applies it to an element, populated at start-up by each user collection
//! type instead of resolved through a vtable.

use std::collections::HashMap;

use crate::holder::Holder;
use crate::index::Index;
use crate::types::HandlerId;

type HandlerFn<Ix, E> = Box<dyn Fn(&mut E, &[u8], &mut Holder<Ix, E>) + Send + Sync>;

/// Table of registered message handlers for one collection instance's
/// element type. `make_collection_impl` builds a fresh, empty one per
/// [`crate::proxy::CollectionProxy`] rather than sharing a single table
/// across every instance of a collection type -- handler ids only need to
/// be stable within one instance's own registrations, not across
/// instances, so a shared table buys nothing here. The `Holder` handed to
/// each handler lets it insert/remove other elements of the same
/// collection from inside its own dispatch (spec §4.3 foreach
/// re-entrancy).
pub struct HandlerRegistry<Ix: Index, E> {
    handlers: HashMap<HandlerId, HandlerFn<Ix, E>>,
}

impl<Ix: Index, E> Default for HandlerRegistry<Ix, E> {
    fn default() -> Self {
        HandlerRegistry {
            handlers: HashMap::new(),
        }
    }
}

impl<Ix: Index, E> HandlerRegistry<Ix, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` so that `dispatch(handler, element, payload,
    /// holder)` deserializes `payload` (via `f`'s own closed-over
    /// deserializer) and applies it to `element`.
    pub fn register(
        &mut self,
        handler: HandlerId,
        f: impl Fn(&mut E, &[u8], &mut Holder<Ix, E>) + Send + Sync + 'static,
    ) {
        self.handlers.insert(handler, Box::new(f));
    }

    pub fn is_registered(&self, handler: HandlerId) -> bool {
        self.handlers.contains_key(&handler)
    }

    /// Applies the registered handler to `element`. Returns `false` (never
    /// panics) if `handler` is not registered -- callers translate that
    /// into [`crate::error::RoutingError::HandlerNotRegistered`].
    pub fn dispatch(&self, handler: HandlerId, element: &mut E, payload: &[u8], holder: &mut Holder<Ix, E>) -> bool {
        if let Some(f) = self.handlers.get(&handler) {
            f(element, payload, holder);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index1D;

    struct Counter {
        value: i64,
    }

    #[test]
    fn register_and_dispatch_applies_payload() {
        let mut reg: HandlerRegistry<Index1D, Counter> = HandlerRegistry::new();
        reg.register(1, |c: &mut Counter, payload: &[u8], _holder: &mut Holder<Index1D, Counter>| {
            let delta = i64::from_le_bytes(payload.try_into().unwrap());
            c.value += delta;
        });

        let mut c = Counter { value: 10 };
        let mut holder: Holder<Index1D, Counter> = Holder::new();
        assert!(reg.dispatch(1, &mut c, &5i64.to_le_bytes(), &mut holder));
        assert_eq!(c.value, 15);
    }

    #[test]
    fn dispatch_unknown_handler_returns_false() {
        let reg: HandlerRegistry<Index1D, Counter> = HandlerRegistry::new();
        let mut c = Counter { value: 0 };
        let mut holder: Holder<Index1D, Counter> = Holder::new();
        assert!(!reg.dispatch(99, &mut c, &[], &mut holder));
    }

    #[test]
    fn dispatched_handler_can_insert_into_the_holder() {
        let mut reg: HandlerRegistry<Index1D, Counter> = HandlerRegistry::new();
        reg.register(2, |_c: &mut Counter, _payload: &[u8], holder: &mut Holder<Index1D, Counter>| {
            holder.insert(
                Index1D(9),
                crate::holder::ElementHolder::new(Counter { value: 0 }, 0, 0),
            );
        });

        let mut c = Counter { value: 0 };
        let mut holder: Holder<Index1D, Counter> = Holder::new();
        assert!(reg.dispatch(2, &mut c, &[], &mut holder));
        assert!(holder.exists(&Index1D(9)));
    }
}
