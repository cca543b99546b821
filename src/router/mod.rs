//! send/broadcast/reduce routing (spec §4.4).

mod message_router;
mod messages;

pub use message_router::{MessageRouter, BCAST_MSG_DELIVERY_HANDLER, COLLECTION_MSG_DELIVERY_HANDLER};
pub use messages::{BcastMessage, CollectionMessage, CollectionStampMsg, DestroyElmMsg, InsertMsg, MigrateMsg};
