//! An in-process multi-node harness for exercising the collaborator-driven
//! protocols end to end, grounded on `test/src/local_socket`'s in-memory
//! routing pattern and `test/src/helpers/test_global_world_manager.rs`'s
//! minimal stand-ins for out-of-scope collaborators. Unlike naia's
//! dedicated `test` crate, this harness ships as an ordinary module of the
//! library (naia's client/server split gives it a natural seam for a
//! separate crate; this crate's symmetric node model does not), so
//! `tests/` integration files can reach it as `vt_collection::testkit`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::collaborators::{GroupCommunicator, LocationManager, Scheduler, Transport};
use crate::construct::{begin_construction, default_map_for_index1d, make_collection_impl, ConstructionConfig};
use crate::holder::GroupId;
use crate::index::Index1D;
use crate::proxy::{CollectionProxy, ProxySequencer};
use crate::registry::TypelessHolder;
use crate::reduce::ReduceEngine;
use crate::insert::InsertionEngine;
use crate::router::MessageRouter;
use crate::types::{Epoch, HandlerId, NodeId};

/// A [`Scheduler`] whose epoch only advances when the test driver calls
/// [`FixedScheduler::advance_epoch`] -- there is no real work-stealing or
/// termination detection to model here.
pub struct FixedScheduler {
    this_node: NodeId,
    num_nodes: NodeId,
    epoch: Epoch,
}

impl Scheduler for FixedScheduler {
    fn this_node(&self) -> NodeId {
        self.this_node
    }
    fn num_nodes(&self) -> NodeId {
        self.num_nodes
    }
    fn current_epoch(&self) -> Epoch {
        self.epoch
    }
    fn post_handler(&mut self, _proxy: CollectionProxy, _handler: HandlerId, _payload: Vec<u8>) {}
    fn run_through_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }
}

/// A [`Transport`] that records every send/broadcast it was asked to
/// perform instead of moving bytes anywhere -- wire encoding is a
/// (documented) seam the core never needs for in-process delivery, so
/// there is nothing for a fake transport to decode. Cross-node scenarios
/// drive the destination side directly through the router's `receive_*`
/// entry points; `sent`/`broadcasts` exist for tests that only need to
/// assert *that* a message was routed off-node.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Vec<(NodeId, HandlerId)>,
    pub broadcasts: Vec<HandlerId>,
}

impl Transport for RecordingTransport {
    fn send_bytes(&mut self, dest: NodeId, delivery_handler: HandlerId, _bytes: Vec<u8>) {
        self.sent.push((dest, delivery_handler));
    }
    fn broadcast_bytes(&mut self, _group: Option<GroupId>, delivery_handler: HandlerId, _bytes: Vec<u8>) {
        self.broadcasts.push(delivery_handler);
    }
}

/// A [`LocationManager`] shared by every node in the cluster, standing in
/// for the out-of-scope distributed directory (spec: "the core consults it
/// opportunistically"). Single-process, so there is no replication lag to
/// simulate.
#[derive(Default)]
pub struct SharedLocation {
    table: HashMap<(u64, u64), NodeId>,
    reservations: HashMap<(u64, u64), NodeId>,
}

impl SharedLocation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationManager<Index1D> for SharedLocation {
    fn resolve(&self, proxy: CollectionProxy, idx: &Index1D) -> Option<NodeId> {
        self.table.get(&(proxy.bits().raw(), idx.0)).copied()
    }
    fn update_location(&mut self, proxy: CollectionProxy, idx: Index1D, node: NodeId) {
        self.table.insert((proxy.bits().raw(), idx.0), node);
        self.reservations.remove(&(proxy.bits().raw(), idx.0));
    }
    fn record_emigration(&mut self, proxy: CollectionProxy, idx: &Index1D, _from: NodeId) {
        self.table.remove(&(proxy.bits().raw(), idx.0));
    }
    fn is_reserved_or_present(&self, proxy: CollectionProxy, idx: &Index1D) -> bool {
        let key = (proxy.bits().raw(), idx.0);
        self.table.contains_key(&key) || self.reservations.contains_key(&key)
    }
    fn reserve(&mut self, proxy: CollectionProxy, idx: Index1D, dest: NodeId) {
        self.reservations.insert((proxy.bits().raw(), idx.0), dest);
    }
}

/// A [`GroupCommunicator`] shared by every node. `rebuild_group` just mints
/// an incrementing id (there is only one process, so "the subset of nodes
/// holding >= 1 element" never needs an actual vote). `allreduce_min_u64`
/// echoes the caller's own value by default -- matching the single-node
/// behavior every other module's fake `GroupCommunicator` already uses --
/// unless the test seeds the round's true cross-node answer up front via
/// [`SharedComm::seed_round_min`], which a multi-node scenario already
/// knows (it holds every node's state) the same way a real allreduce would
/// compute it internally.
#[derive(Default)]
pub struct SharedComm {
    next_group: GroupId,
    seeded_min: Option<u64>,
}

impl SharedComm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_round_min(&mut self, value: u64) {
        self.seeded_min = Some(value);
    }
}

impl GroupCommunicator for SharedComm {
    fn rebuild_group(&mut self, _proxy: CollectionProxy, _node_has_elements: bool) -> GroupId {
        self.next_group += 1;
        self.next_group
    }
    fn allreduce_to_root(
        &mut self,
        _group: Option<GroupId>,
        _op_handler: HandlerId,
        _root: NodeId,
        _local_value: Vec<u8>,
    ) {
    }
    fn allreduce_min_u64(&mut self, local_min: u64) -> u64 {
        self.seeded_min.take().unwrap_or(local_min)
    }
}

/// One node's worth of state (spec §1 component list, minus the
/// out-of-scope collaborators, which [`FakeCluster`] holds once and shares).
pub struct ClusterNode {
    pub scheduler: FixedScheduler,
    pub registry: TypelessHolder,
    pub router: MessageRouter<Index1D>,
    pub reduce: ReduceEngine<Index1D>,
    pub insertion: InsertionEngine<Index1D>,
    pub transport: RecordingTransport,
}

/// A fixed-size collection of [`ClusterNode`]s plus the collaborators they
/// share, for driving multi-node scenario tests without a real transport
/// or scheduler (spec §8's scenarios S1-S6).
pub struct FakeCluster {
    pub nodes: Vec<ClusterNode>,
    pub location: SharedLocation,
    pub comm: SharedComm,
}

impl FakeCluster {
    pub fn new(num_nodes: NodeId) -> Self {
        let nodes = (0..num_nodes)
            .map(|this_node| ClusterNode {
                scheduler: FixedScheduler { this_node, num_nodes, epoch: 0 },
                registry: TypelessHolder::new(),
                router: MessageRouter::new(),
                reduce: ReduceEngine::new(),
                insertion: InsertionEngine::new(),
                transport: RecordingTransport::default(),
            })
            .collect();
        FakeCluster {
            nodes,
            location: SharedLocation::new(),
            comm: SharedComm::new(),
        }
    }

    pub fn num_nodes(&self) -> NodeId {
        self.nodes.len() as NodeId
    }

    /// Collectively constructs a bounded collection of `E` over
    /// `Index1D(0)..Index1D(extent)` on every node, using the default
    /// block map, and returns the shared [`CollectionProxy`] (spec §4.8,
    /// scenario S1).
    pub fn construct_bounded<E: Send + 'static>(
        &mut self,
        proxy_seq: &mut ProxySequencer,
        extent: u64,
        cons_fn: Arc<dyn Fn(&Index1D) -> E + Send + Sync>,
    ) -> CollectionProxy {
        let proxy = begin_construction(proxy_seq, 0, true, false);
        let FakeCluster { nodes, location, comm } = self;
        for node in nodes.iter_mut() {
            let mut config: ConstructionConfig<Index1D, E> = ConstructionConfig::new();
            config.bounds = Some(Index1D(extent));
            config.bulk_inserts.push((Index1D(0), Index1D(extent)));
            config.map = default_map_for_index1d(true);
            config.cons_fn = Some(cons_fn.clone());
            make_collection_impl(proxy, config, &mut node.registry, &node.scheduler, location, comm, 0)
                .expect("cluster-wide construction should succeed on every node");
        }
        proxy
    }

    pub fn node(&mut self, id: NodeId) -> &mut ClusterNode {
        &mut self.nodes[id as usize]
    }
}
