//! Construction pipeline: parameter-object builder -> distributed seeding
//! of holders across nodes (spec §4.8).

mod construction_pipeline;

pub use construction_pipeline::{
    default_map_for_index1d, default_map_for_index2d, make_collection_impl, ConstructionConfig,
};

use crate::proxy::{CollectionProxy, ProxySequencer};
use crate::types::NodeId;

/// Allocates the [`CollectionProxy`] for a new collection (spec §4.8
/// `wait()`/`deferWithEpoch`: "allocate a new CP"). Collective and rooted
/// construction draw from independent sequence counters via
/// [`ProxySequencer`].
pub fn begin_construction(
    sequencer: &mut ProxySequencer,
    this_node: NodeId,
    collective: bool,
    migratable: bool,
) -> CollectionProxy {
    CollectionProxy::from_bits(sequencer.make_proxy(collective, migratable, this_node))
}
