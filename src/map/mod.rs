//! Index-to-node resolution (spec §4.2).

mod default_maps;
mod map_resolver;

pub use default_maps::{BlockMap, BlockMap2D, HashMap, RoundRobinMap};
pub use map_resolver::{resolve_home, MapFn, MapHandle};
