//! `map(CP, IX) -> node` (spec §4.2). Two forms are supported: a
//! pre-registered pure function of `(index, bounds, num_nodes)`, or an
//! object-group instance exposing the same signature per node. Both are
//! required to be pure functions of their inputs (spec: "the map must be a
//! pure function of its inputs").

use std::sync::Arc;

use crate::index::Index;
use crate::types::NodeId;

/// A map function: `(index, bounds, num_nodes) -> node`. `bounds` is `None`
/// for unbounded (dynamic-membership, object-group-mapped) collections.
pub trait MapFn<Ix: Index>: Send + Sync {
    fn map(&self, idx: &Ix, bounds: Option<&Ix>, num_nodes: NodeId) -> NodeId;
}

/// Either form of map a [`crate::registry::MetaCollection`] can carry
/// (spec §4.2(a)/(b)). Cloning is cheap: both variants are reference-
/// counted handles, not the map state itself.
#[derive(Clone)]
pub enum MapHandle<Ix: Index> {
    /// A pre-registered function, referenced by a stable handle so it can
    /// be named across nodes without shipping a closure over the wire.
    Function(Arc<dyn MapFn<Ix>>),
    /// A per-node object-group instance (used by unbounded collections);
    /// modeled the same as `Function` here since both reduce to "a pure
    /// function of its inputs" once resolved locally.
    Object(Arc<dyn MapFn<Ix>>),
}

impl<Ix: Index> MapHandle<Ix> {
    pub fn resolve(&self, idx: &Ix, bounds: Option<&Ix>, num_nodes: NodeId) -> NodeId {
        match self {
            MapHandle::Function(f) | MapHandle::Object(f) => f.map(idx, bounds, num_nodes),
        }
    }
}

/// Resolves `(proxy, idx) -> home node` given the collection's
/// [`MetaCollection`](crate::registry::MetaCollection) entry. Kept as a
/// free function (not a struct) since it needs no state beyond what the
/// caller already holds; ties are broken deterministically because
/// `MapFn` implementations are pure.
pub fn resolve_home<Ix: Index>(
    map: &MapHandle<Ix>,
    idx: &Ix,
    bounds: Option<&Ix>,
    num_nodes: NodeId,
) -> NodeId {
    map.resolve(idx, bounds, num_nodes)
}
