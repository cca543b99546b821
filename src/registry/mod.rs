//! Node-wide registry of live collections (spec §4.3, "TypelessHolder +
//! MetaCollection") and the handler table that replaces virtual dispatch
//! (spec §9).

mod handler_registry;
mod meta_collection;
mod typeless_holder;

pub use handler_registry::HandlerRegistry;
pub use meta_collection::MetaCollection;
pub use typeless_holder::{CollectionEntry, TypelessHolder};
