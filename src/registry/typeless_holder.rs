//! Node-wide registry of all live collections, keyed by proxy (spec §4.3,
//! "TypelessHolder + MetaCollection").
//!
//! Each collection is generic over its element type and index type, which
//! differ per user collection class -- there is no single concrete type the
//! registry can store directly. Rather than replicate the source's
//! virtual-base-plus-template-handler dispatch (spec §9's redesign flag),
//! entries are stored type-erased behind `Any` and downcast back to their
//! concrete `CollectionEntry<Ix, E>` by the one call site (the router) that
//! already knows the static types from the `CollectionProxy<Ix, E>` the
//! user code is holding.

use std::any::Any;
use std::collections::HashMap;

use crate::holder::Holder;
use crate::index::Index;
use crate::proxy::CollectionProxy;
use crate::registry::handler_registry::HandlerRegistry;
use crate::registry::meta_collection::MetaCollection;

/// The node-local state of one collection: its element storage, its
/// metadata, and its handler table.
pub struct CollectionEntry<Ix: Index, E> {
    pub holder: Holder<Ix, E>,
    pub meta: MetaCollection<Ix>,
    pub handlers: HandlerRegistry<Ix, E>,
}

impl<Ix: Index, E> CollectionEntry<Ix, E> {
    pub fn new(meta: MetaCollection<Ix>, handlers: HandlerRegistry<Ix, E>) -> Self {
        CollectionEntry {
            holder: Holder::new(),
            meta,
            handlers,
        }
    }
}

trait ErasedEntry: Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn destroy_all(&mut self);
    fn len(&self) -> usize;
}

impl<Ix: Index, E: Send + 'static> ErasedEntry for CollectionEntry<Ix, E> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn destroy_all(&mut self) {
        self.holder.destroy_all();
    }

    fn len(&self) -> usize {
        self.holder.len()
    }
}

/// Node-wide registry of all live collections, keyed by [`CollectionProxy`].
#[derive(Default)]
pub struct TypelessHolder {
    collections: HashMap<CollectionProxy, Box<dyn ErasedEntry>>,
}

impl TypelessHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<Ix: Index, E: Send + 'static>(
        &mut self,
        proxy: CollectionProxy,
        entry: CollectionEntry<Ix, E>,
    ) {
        self.collections.insert(proxy, Box::new(entry));
    }

    pub fn contains(&self, proxy: CollectionProxy) -> bool {
        self.collections.contains_key(&proxy)
    }

    pub fn get<Ix: Index, E: Send + 'static>(
        &self,
        proxy: CollectionProxy,
    ) -> Option<&CollectionEntry<Ix, E>> {
        self.collections
            .get(&proxy)
            .and_then(|e| e.as_any().downcast_ref())
    }

    pub fn get_mut<Ix: Index, E: Send + 'static>(
        &mut self,
        proxy: CollectionProxy,
    ) -> Option<&mut CollectionEntry<Ix, E>> {
        self.collections
            .get_mut(&proxy)
            .and_then(|e| e.as_any_mut().downcast_mut())
    }

    /// Collective destroy: tears down the local side of one collection,
    /// rejecting further insertions (spec §4.3).
    pub fn destroy_all(&mut self, proxy: CollectionProxy) {
        if let Some(entry) = self.collections.get_mut(&proxy) {
            entry.destroy_all();
        }
    }

    /// Global teardown of every collection still registered on this node
    /// (spec §2, "Cleanup & teardown").
    pub fn teardown_all(&mut self) {
        for entry in self.collections.values_mut() {
            entry.destroy_all();
        }
        self.collections.clear();
    }

    pub fn local_count(&self, proxy: CollectionProxy) -> Option<usize> {
        self.collections.get(&proxy).map(|e| e.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index1D;
    use crate::map::{BlockMap, MapHandle};
    use crate::proxy::{ProxyBits, ProxySequencer};

    fn make_proxy(seq: &mut ProxySequencer) -> CollectionProxy {
        CollectionProxy::from_bits(seq.make_proxy(true, false, 0))
    }

    #[test]
    fn register_and_downcast_roundtrip() {
        let mut seq = ProxySequencer::new();
        let proxy = make_proxy(&mut seq);
        let mut registry = TypelessHolder::new();
        let meta = MetaCollection::new(
            MapHandle::Function(std::sync::Arc::new(BlockMap)),
            Some(Index1D(8)),
            false,
            false,
            false,
        );
        let entry: CollectionEntry<Index1D, i32> =
            CollectionEntry::new(meta, HandlerRegistry::new());
        registry.register(proxy, entry);

        assert!(registry.contains(proxy));
        let got = registry.get_mut::<Index1D, i32>(proxy).unwrap();
        got.holder
            .insert(Index1D(0), crate::holder::ElementHolder::new(7, 0, 0));
        assert_eq!(registry.local_count(proxy), Some(1));
    }

    #[test]
    fn destroy_all_rejects_further_downcasts_as_empty() {
        let mut seq = ProxySequencer::new();
        let proxy = make_proxy(&mut seq);
        let mut registry = TypelessHolder::new();
        let meta = MetaCollection::new(
            MapHandle::Function(std::sync::Arc::new(BlockMap)),
            Some(Index1D(8)),
            false,
            false,
            false,
        );
        let entry: CollectionEntry<Index1D, i32> =
            CollectionEntry::new(meta, HandlerRegistry::new());
        registry.register(proxy, entry);
        registry.destroy_all(proxy);
        assert_eq!(registry.local_count(proxy), Some(0));
        assert!(registry.get::<Index1D, i32>(proxy).unwrap().holder.is_destroyed());
    }
}
