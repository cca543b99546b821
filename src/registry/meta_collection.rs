//! Per-collection metadata (spec §3, "MetaCollection (per CP)").

use crate::map::MapHandle;

/// Node-wide, per-`CollectionProxy` metadata: which map to use, its
/// optional bounds, membership mode, migratability, and the reduce stamp
/// of the last-finalized modification epoch. Which epoch is currently
/// open, if any, is tracked by [`crate::insert::InsertionEngine`] instead
/// (keyed by proxy across every collection it serves), not duplicated
/// here.
pub struct MetaCollection<Ix> {
    pub map: MapHandle<Ix>,
    pub bounds: Option<Ix>,
    pub dynamic_membership: bool,
    pub migratable: bool,
    pub keep_last_elm_on_migrate: bool,
    /// Reduce stamp all elements were reconciled to at the last
    /// `finishModification` (spec §4.7 step 4); `0` until the first
    /// modification epoch completes.
    pub last_modification_stamp: u64,
}

impl<Ix> MetaCollection<Ix> {
    pub fn new(
        map: MapHandle<Ix>,
        bounds: Option<Ix>,
        dynamic_membership: bool,
        migratable: bool,
        keep_last_elm_on_migrate: bool,
    ) -> Self {
        MetaCollection {
            map,
            bounds,
            dynamic_membership,
            migratable,
            keep_last_elm_on_migrate,
            last_modification_stamp: 0,
        }
    }
}
