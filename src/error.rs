//! Error taxonomy for the core (spec §7): one `thiserror` enum per module
//! area that has a fallible operation, in the style of
//! `naia_shared::connection::error::ConnectionError`. `proxy`, `holder`,
//! `map`, and `reduce` have no enum here -- see `SPEC_FULL.md`'s "Error
//! handling" section for why each of those stays infallible.

use thiserror::Error;

use crate::types::{HandlerId, NodeId};

/// A message arrived for a collection proxy this node has no registry entry
/// for, or delivery reached an index the local holder does not have.
/// Both are contract violations at the location manager or a stale proxy;
/// fatal per spec §7.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no collection registered locally for proxy {proxy:?}")]
    ProxyMissing { proxy: crate::proxy::CollectionProxy },

    #[error("no live element at index for proxy {proxy:?}")]
    ElementMissing { proxy: crate::proxy::CollectionProxy },

    #[error("handler {handler} is not registered")]
    HandlerNotRegistered { handler: HandlerId },
}

/// Errors raised by the dynamic-membership insertion/deletion protocol.
/// `InsertionRace` is recoverable and never surfaced past the engine: it is
/// folded silently into a cancelled insertion per spec §5/§7.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("insertion of index into {proxy:?} cancelled: already reserved or present at home")]
    InsertionRace { proxy: crate::proxy::CollectionProxy },

    #[error("collection {proxy:?} is destroyed, insertion rejected")]
    HolderDestroyed { proxy: crate::proxy::CollectionProxy },

    #[error("modification token does not match any open epoch on {proxy:?}")]
    UnknownToken { proxy: crate::proxy::CollectionProxy },
}

/// Errors raised by migration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrateError {
    #[error("migrate of index in {proxy:?} to node {dest} is a no-op: destination equals current node")]
    MigrateToSelf { proxy: crate::proxy::CollectionProxy, dest: NodeId },

    #[error("migrate of last element in {proxy:?} refused: keep_last_elm_on_migrate is set")]
    LastElementKept { proxy: crate::proxy::CollectionProxy },

    #[error("migrate-in for {proxy:?} arrived after the collection was destroyed locally")]
    DestroyedDuringMigrate { proxy: crate::proxy::CollectionProxy },
}

/// Errors raised by the construction pipeline's parameter-object builder.
/// Fatal per spec §7: these abort at `wait()`, they are never silently
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
    #[error("conflicting construction options: list_insert_bounds cannot be combined with bulk or list inserts")]
    OptionConflict,

    #[error("collective-only construction option used on a rooted collection")]
    RootedCollectiveMismatch,

    #[error("no map handler or map object supplied and no default exists for this index type")]
    NoDefaultMap,
}

/// Errors raised while checkpointing or restoring a collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckpointError {
    #[error("failed to write directory file at {path}")]
    DirectoryWriteFailed { path: String },

    #[error("failed to read directory file at {path}")]
    DirectoryReadFailed { path: String },

    #[error("failed to serialize element at index for checkpoint")]
    SerializeFailed,

    #[error("failed to deserialize element at index during restore")]
    DeserializeFailed,
}
