//! Parameter-object builder -> distributed seeding of holders (spec §4.8),
//! grounded on
//! `original_source/src/vrt/collection/collection_manager.impl.h`'s
//! `makeCollection`/`insertCollectionElement`.

use std::sync::Arc;

use crate::collaborators::{GroupCommunicator, LocationManager, Scheduler};
use crate::error::ConstructError;
use crate::holder::Holder;
use crate::index::{Index, Index1D, Index2D};
use crate::map::{BlockMap, BlockMap2D, MapFn, MapHandle};
use crate::proxy::{CollectionProxy, ProxySequencer};
use crate::registry::{CollectionEntry, HandlerRegistry, MetaCollection, TypelessHolder};
use crate::types::LbElmId;

/// The parameter-object builder (spec §4.8). `cons_fn` defaults to
/// `Default::default()` when `E: Default` via [`ConstructionConfig::with_default_ctor`];
/// callers building non-`Default` element types must supply one explicitly.
pub struct ConstructionConfig<Ix: Index, E> {
    pub bounds: Option<Ix>,
    pub bulk_inserts: Vec<(Ix, Ix)>,
    pub list_inserts: Vec<Ix>,
    pub list_insert_here: Vec<(Ix, E)>,
    pub list_insert_bounds_only: bool,
    pub cons_fn: Option<Arc<dyn Fn(&Ix) -> E + Send + Sync>>,
    pub dynamic_membership: bool,
    pub collective: bool,
    pub migratable: bool,
    pub keep_last_elm_on_migrate: bool,
    pub map: Option<MapHandle<Ix>>,
}

impl<Ix: Index, E> Default for ConstructionConfig<Ix, E> {
    fn default() -> Self {
        ConstructionConfig {
            bounds: None,
            bulk_inserts: Vec::new(),
            list_inserts: Vec::new(),
            list_insert_here: Vec::new(),
            list_insert_bounds_only: false,
            cons_fn: None,
            dynamic_membership: false,
            collective: true,
            migratable: false,
            keep_last_elm_on_migrate: false,
            map: None,
        }
    }
}

impl<Ix: Index, E> ConstructionConfig<Ix, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the option combinations spec §4.8 calls out as an abort
    /// condition: `list_insert_bounds_only` (the builder's "just use
    /// bounds, no other inserts" mode) combined with any explicit insert
    /// list, and `collective`-only fields (`list_inserts`,
    /// `list_insert_here`, a non-default `cons_fn`) used on a rooted
    /// (non-collective) collection.
    pub fn validate(&self) -> Result<(), ConstructError> {
        if self.list_insert_bounds_only
            && (!self.bulk_inserts.is_empty()
                || !self.list_inserts.is_empty()
                || !self.list_insert_here.is_empty())
        {
            return Err(ConstructError::OptionConflict);
        }
        if !self.collective && (!self.list_inserts.is_empty() || !self.list_insert_here.is_empty()) {
            return Err(ConstructError::RootedCollectiveMismatch);
        }
        Ok(())
    }
}

/// Picks the default map for bounded/unbounded index types (spec §4.8
/// step 1). Only `Index1D`/`Index2D` have built-in defaults; other index
/// types must supply `map` explicitly.
pub fn default_map_for_index1d(bounded: bool) -> Option<MapHandle<Index1D>> {
    if bounded {
        Some(MapHandle::Function(Arc::new(BlockMap)))
    } else {
        Some(MapHandle::Object(Arc::new(crate::map::HashMap::<Index1D>::new())))
    }
}

pub fn default_map_for_index2d(bounded: bool) -> Option<MapHandle<Index2D>> {
    if bounded {
        Some(MapHandle::Function(Arc::new(BlockMap2D)))
    } else {
        Some(MapHandle::Object(Arc::new(crate::map::HashMap::<Index2D>::new())))
    }
}

/// `makeCollectionImpl` (spec §4.8): runs identically on every node of a
/// collective construction (or on every node that receives the rooted
/// broadcast). Registers the collection in `registry` and seeds `holder`
/// with every index this node is responsible for.
#[allow(clippy::too_many_arguments)]
pub fn make_collection_impl<Ix: Index, E: Send + 'static>(
    proxy: CollectionProxy,
    config: ConstructionConfig<Ix, E>,
    registry: &mut TypelessHolder,
    scheduler: &dyn Scheduler,
    location: &mut dyn LocationManager<Ix>,
    comm: &mut dyn GroupCommunicator,
    lb_id_start: LbElmId,
) -> Result<(), ConstructError> {
    config.validate()?;

    let map = config.map.clone().ok_or(ConstructError::NoDefaultMap)?;
    let meta = MetaCollection::new(
        map.clone(),
        config.bounds.clone(),
        config.dynamic_membership,
        config.migratable,
        config.keep_last_elm_on_migrate,
    );
    let entry: CollectionEntry<Ix, E> = CollectionEntry::new(meta, HandlerRegistry::new());
    registry.register(proxy, entry);

    let this_node = scheduler.this_node();
    let num_nodes = scheduler.num_nodes();
    let mut lb_id = lb_id_start;
    let mut any_constructed = false;

    let entry: &mut CollectionEntry<Ix, E> = registry
        .get_mut(proxy)
        .expect("just registered this proxy");

    let cons_fn = config.cons_fn.clone();
    let bounds = config.bounds.clone();

    let mut seed = |holder: &mut Holder<Ix, E>, idx: Ix, local_only: bool| {
        let owner = map.resolve(&idx, bounds.as_ref(), num_nodes);
        if local_only || owner == this_node {
            let element = match &cons_fn {
                Some(f) => f(&idx),
                None => panic!("make_collection_impl requires cons_fn for element construction"),
            };
            holder.insert(
                idx.clone(),
                crate::holder::ElementHolder::new(element, this_node, lb_id),
            );
            location.update_location(proxy, idx, this_node);
            lb_id += 1;
            any_constructed = true;
        }
    };

    for (start, range) in &config.bulk_inserts {
        start.foreach_in_range(range, &mut |idx| seed(&mut entry.holder, idx, false));
    }
    for idx in config.list_inserts {
        seed(&mut entry.holder, idx, false);
    }
    for (idx, element) in config.list_insert_here {
        entry.holder.insert(
            idx.clone(),
            crate::holder::ElementHolder::new(element, this_node, lb_id),
        );
        location.update_location(proxy, idx, this_node);
        lb_id += 1;
        any_constructed = true;
    }

    if any_constructed {
        let group_id = comm.rebuild_group(proxy, !entry.holder.is_empty());
        entry.holder.set_group(group_id);
    }

    log::debug!("constructed collection {:?}: {} local elements", proxy, entry.holder.len());
    Ok(())
}
