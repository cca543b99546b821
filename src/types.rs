//! Scalar types shared across the core, mirroring `vt`'s `type_aliases.h`.

/// A rank in the fixed set of nodes the collection runtime runs across.
pub type NodeId = u32;

/// Identifies a registered message/reduce-op handler, populated at start-up
/// by each user collection type (see [`crate::router::HandlerRegistry`]).
pub type HandlerId = u64;

/// Identifies a registered map function (see [`crate::map::MapResolver`]).
pub type MapHandlerId = u64;

/// Monotone sequence number local to one node, used inside [`crate::proxy::ProxyBits`].
pub type SequenceId = u64;

/// A stable id handed out to an element for the lifetime of its stay on one
/// node; consumed by the (out-of-scope) load-balancer statistics collector.
pub type LbElmId = u64;

/// The scheduler epoch a message is stamped with when it is posted (see
/// spec.md §5). Opaque to the core beyond ordering comparisons.
pub type Epoch = u64;

/// Identifies an open modification epoch (see [`crate::insert::ModificationToken`]).
pub type ModEpochId = u64;

/// Monotone broadcast-epoch counter stamped by a collection's root node.
pub type BcastEpochId = u32;
