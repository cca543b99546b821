//! # vt-collection
//!
//! Core runtime for distributed virtual-entity collections: a fixed set of
//! nodes cooperatively own a sparse, indexed set of elements, addressed by
//! opaque proxies rather than direct references. The core is deliberately
//! collaborator-driven: it never picks a transport, scheduler, serializer,
//! or location directory itself (see [`collaborators`]), so an embedding
//! host supplies those and this crate supplies the element lifecycle,
//! routing, reduction, migration, and dynamic-membership protocols on top.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod checkpoint;
pub mod collaborators;
pub mod config;
pub mod construct;
pub mod error;
pub mod holder;
pub mod index;
pub mod insert;
pub mod map;
pub mod migrate;
pub mod proxy;
pub mod reduce;
pub mod registry;
pub mod router;
pub mod testkit;
pub mod types;

pub use collaborators::{GroupCommunicator, LbStatsCollector, LocationManager, Scheduler, Serializer, Transport, TraceRecorder};
pub use config::RuntimeConfig;
pub use construct::{begin_construction, make_collection_impl, ConstructionConfig};
pub use holder::{ElementHolder, Holder};
pub use index::{Index, Index1D, Index2D};
pub use insert::{InsertOutcome, InsertionEngine, ModificationToken};
pub use map::{BlockMap, BlockMap2D, MapFn, MapHandle, RoundRobinMap};
pub use migrate::{migrate_in, migrate_out, ElementCodec, MigrateHooks};
pub use proxy::{CollectionProxy, ElementProxy, ProxySequencer};
pub use reduce::{ReduceEngine, ReduceStamp};
pub use registry::{CollectionEntry, HandlerRegistry, MetaCollection, TypelessHolder};
pub use router::MessageRouter;
pub use types::{BcastEpochId, Epoch, HandlerId, LbElmId, MapHandlerId, ModEpochId, NodeId, SequenceId};
