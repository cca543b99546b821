//! Migration between nodes (spec §4.6).

mod migration_engine;
mod migration_hooks;

use crate::types::HandlerId;

pub use migration_engine::{migrate_in, migrate_out, ElementCodec};
#[cfg(feature = "postcard_support")]
pub use migration_engine::PostcardElementCodec;
pub use migration_hooks::MigrateHooks;

/// The handler id a [`crate::collaborators::Transport`] delivers a landed
/// [`crate::router::MigrateMsg`] to.
pub const MIGRATE_MSG_DELIVERY_HANDLER: HandlerId = u64::MAX - 3;
