//! Contract-only traits for the subsystems spec.md §1 calls out as "external
//! collaborators": the scheduler/epoch/termination service, the active-
//! message transport, the location manager, the serializer, the trace/
//! diagnostic recorder, the load-balancer statistics collector, and the
//! group/collective communicator. The core depends only on these traits;
//! it never assumes a particular transport or scheduler implementation.
//!
//! Grounded on `naia_server`'s split between `naia-server` (protocol) and
//! `naia-server-socket`/`quinn` (transport) behind a trait boundary — here
//! every such seam is a single trait instead of a Cargo feature flag,
//! because the core never needs to pick a concrete transport itself.

use crate::index::Index;
use crate::proxy::{CollectionProxy, ElementProxy};
use crate::types::{Epoch, HandlerId, NodeId};

/// The surrounding scheduler/epoch/termination service (spec §1, out of
/// scope). Collection operations post work items or immediate deliveries
/// into it; it owns epoch stamping and the run-through-epoch loop used by
/// `finishModification` (spec §5).
pub trait Scheduler {
    /// This node's id in the fixed node set.
    fn this_node(&self) -> NodeId;

    /// Total number of nodes in the fixed set.
    fn num_nodes(&self) -> NodeId;

    /// The scheduler epoch to stamp onto a message posted right now.
    fn current_epoch(&self) -> Epoch;

    /// Schedule `handler` to run against element `idx` inside collection
    /// `proxy`, with the given opaque message payload, preserving the
    /// contextual epoch push/pop described in spec §4.4.
    fn post_handler(
        &mut self,
        proxy: CollectionProxy,
        handler: HandlerId,
        payload: Vec<u8>,
    );

    /// Run the scheduler until the given modification epoch has been
    /// observed as terminated everywhere (spec §4.7, §5: "yielding control
    /// back to the scheduler via an internal run-through-epoch loop").
    fn run_through_epoch(&mut self, epoch: Epoch);
}

/// The active-message transport (spec §1, out of scope). The core hands it
/// pre-serialized bytes addressed to a node and a delivery handler id; it
/// is responsible for getting the bytes there, in order, exactly once.
pub trait Transport {
    fn send_bytes(&mut self, dest: NodeId, delivery_handler: HandlerId, bytes: Vec<u8>);

    /// Broadcast to every node in `group`, or to all nodes if `group` is
    /// `None` (the "default all-nodes group" of spec §4.4/§4.5).
    fn broadcast_bytes(
        &mut self,
        group: Option<crate::holder::GroupId>,
        delivery_handler: HandlerId,
        bytes: Vec<u8>,
    );
}

/// The location manager (spec §1, out of scope): directory of which node
/// currently owns a given index. The core consults it opportunistically
/// (it is not required to be authoritative the instant a migration
/// completes) and keeps it updated on migration/insertion.
pub trait LocationManager<Ix: Index> {
    /// Resolve the current owner of `idx` within `proxy`, if known.
    fn resolve(&self, proxy: CollectionProxy, idx: &Ix) -> Option<NodeId>;

    /// Record that `idx` now lives on `node` (insertion, migrate-in).
    fn update_location(&mut self, proxy: CollectionProxy, idx: Ix, node: NodeId);

    /// Record that `idx` has left `from` (migrate-out) -- the directory
    /// may drop or mark-stale its entry until the corresponding
    /// `update_location` from the destination arrives.
    fn record_emigration(&mut self, proxy: CollectionProxy, idx: &Ix, from: NodeId);

    /// True if the home node already has an uncommitted reservation or a
    /// live entry for `idx` -- used by the insertion engine's reservation
    /// ping protocol (spec §4.7).
    fn is_reserved_or_present(&self, proxy: CollectionProxy, idx: &Ix) -> bool;

    /// Reserve `idx` for `dest` ahead of the real insertion arriving
    /// (spec §4.7: "registers a remote-entity reservation for `dest`").
    fn reserve(&mut self, proxy: CollectionProxy, idx: Ix, dest: NodeId);
}

/// The serializer (spec §1, out of scope): turns element/message bytes in
/// and out. The reference implementation (`postcard_support` feature) is
/// in [`crate::checkpoint`] / [`crate::migrate`]; this trait is the seam a
/// host can swap in another wire format through.
pub trait Serializer<T> {
    fn serialize(&self, value: &T) -> Vec<u8>;
    fn deserialize(&self, bytes: &[u8]) -> Option<T>;
}

/// The trace/diagnostic recorder (spec §1, out of scope). The core emits
/// fire-and-forget events; a no-op implementation is always valid.
pub trait TraceRecorder {
    fn record_send<Ix: Index>(&mut self, elm: &ElementProxy<Ix>, handler: HandlerId);
    fn record_broadcast(&mut self, proxy: CollectionProxy, handler: HandlerId);
    fn record_migrate<Ix: Index>(&mut self, elm: &ElementProxy<Ix>, from: NodeId, to: NodeId);
}

/// The load-balancer statistics collector (spec §1, out of scope). Fed by
/// [`crate::router::MessageRouter`] on every local delivery and by
/// [`crate::holder::Holder`]'s listener fan-out on lifecycle events.
pub trait LbStatsCollector<Ix: Index> {
    fn record_delivery(&mut self, idx: &Ix, handler: HandlerId);
    fn record_element_load(&mut self, idx: &Ix, load: f64);
}

/// The group/collective communicator (spec §1, out of scope): builds and
/// tracks the communicator subset covering nodes that own >= 1 element of a
/// collection, and performs the reduction's cross-node combine step.
pub trait GroupCommunicator {
    /// Rebuild (or build for the first time) the group for `proxy`.
    /// `node_has_elements` is this node's own membership vote; the
    /// collaborator is responsible for aggregating votes across the fixed
    /// node set into the actual subset (spec §4.7 step 5: "Rebuild the
    /// collection's group over the set of nodes now holding >= 1 element").
    fn rebuild_group(
        &mut self,
        proxy: CollectionProxy,
        node_has_elements: bool,
    ) -> crate::holder::GroupId;

    /// Combine `local_value` across every node in `group` (or all nodes, if
    /// `group` is `None`) using an operator identified by `op_handler`,
    /// delivering the combined result to `root`.
    fn allreduce_to_root(
        &mut self,
        group: Option<crate::holder::GroupId>,
        op_handler: HandlerId,
        root: NodeId,
        local_value: Vec<u8>,
    );

    /// Blocking min-allreduce of a `u64` across every node, with the result
    /// delivered back to every node (not just a root). Used by
    /// `finishModification`'s reduce-stamp reconciliation (spec §4.7 step
    /// 3), which every node needs the answer to, not just a root.
    fn allreduce_min_u64(&mut self, local_min: u64) -> u64;
}
