//! Dynamic-membership insertion/deletion epoch protocol (spec §4.7).

mod insertion_engine;
mod token;

pub use insertion_engine::{
    InsertOutcome, InsertionEngine, DESTROY_MSG_DELIVERY_HANDLER, INSERT_MSG_DELIVERY_HANDLER,
};
pub use token::ModificationToken;
