//! Collective reduction (spec §4.5).

mod reduce_engine;
mod reduce_stamp;

pub use reduce_engine::{ReduceEngine, ReduceOp};
pub use reduce_stamp::ReduceStamp;
