//! Checkpoint/restore to the local filesystem (spec §4.9, §6). Only built
//! when the `postcard_support` feature is enabled; the reference
//! serialization backend is `postcard` (see `SPEC_FULL.md`).

#[cfg(feature = "postcard_support")]
mod checkpoint_directory;

#[cfg(feature = "postcard_support")]
pub use checkpoint_directory::{
    checkpoint_to_file, read_directory_and_elements, restore_in_place_from_file, DirEntry,
};
