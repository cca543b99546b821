//! Element-side migration lifecycle hooks (spec §4.6). Default no-op
//! implementations are provided so user element types only override the
//! ones they care about, matching the source's `migrate_hooks.h` being a
//! thin optional mixin rather than a required virtual interface.

/// Hooks an element type may implement to observe its own migration.
pub trait MigrateHooks {
    /// Called just before the element is serialized and removed from the
    /// source node's holder.
    fn pre_migrate_out(&mut self) {}

    /// Called on the source node immediately after the migrate message has
    /// been handed to the transport, before the local copy is dropped.
    fn epi_migrate_out(&mut self) {}

    /// Called on the destination node just before the deserialized element
    /// is inserted into the local holder.
    fn pre_migrate_in(&mut self) {}

    /// Called on the destination node immediately after insertion.
    fn epi_migrate_in(&mut self) {}
}
