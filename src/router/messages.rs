//! Wire message shapes (spec §6). All carry an envelope with epoch, and
//! (for sends) sender node; `from_trace_event` is represented as an
//! optional opaque id handed to the (out-of-scope) trace recorder rather
//! than carried on the wire, since the core never interprets it itself.

use crate::index::Index;
use crate::proxy::CollectionProxy;
use crate::types::{BcastEpochId, Epoch, HandlerId, ModEpochId, NodeId};

/// `send` envelope (spec §6: `CollectionMessage`).
#[derive(Clone, Debug)]
pub struct CollectionMessage<Ix: Index> {
    pub vrt_handler: HandlerId,
    pub to_idx: Ix,
    pub to_proxy: CollectionProxy,
    pub from: NodeId,
    pub epoch: Epoch,
    pub payload: Vec<u8>,
}

/// `broadcast` envelope (spec §6: `BcastMessage`).
#[derive(Clone, Debug)]
pub struct BcastMessage {
    pub vrt_handler: HandlerId,
    pub bcast_proxy: CollectionProxy,
    pub from: NodeId,
    pub bcast_epoch: BcastEpochId,
    pub payload: Vec<u8>,
}

/// `InsertMsg<ColT,MsgT>` (spec §6).
#[derive(Clone, Debug)]
pub struct InsertMsg<Ix: Index> {
    pub proxy: CollectionProxy,
    pub idx: Ix,
    pub construct_node: NodeId,
    pub home_node: NodeId,
    pub insert_epoch: ModEpochId,
    pub pinged: bool,
    pub inner_payload: Option<Vec<u8>>,
}

/// `MigrateMsg<ColT,IX>` (spec §6).
#[derive(Clone, Debug)]
pub struct MigrateMsg<Ix: Index> {
    pub elm_proxy: CollectionProxy,
    pub idx: Ix,
    pub from: NodeId,
    pub to: NodeId,
    pub map_handler: crate::types::MapHandlerId,
    pub element_bytes: Vec<u8>,
}

/// `DestroyElmMsg` (spec §6).
#[derive(Clone, Debug)]
pub struct DestroyElmMsg<Ix: Index> {
    pub proxy: CollectionProxy,
    pub idx: Ix,
    pub modifier_epoch: ModEpochId,
}

/// `CollectionStampMsg` (spec §6, reduction).
#[derive(Clone, Debug)]
pub struct CollectionStampMsg {
    pub proxy: CollectionProxy,
    pub seq: u64,
}
