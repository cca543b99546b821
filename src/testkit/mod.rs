//! In-process test utilities: a concrete element type and a multi-node
//! harness for scenario-level tests (spec §8). Not gated behind `#[cfg(test)]`
//! so `tests/` integration files can reach it as `vt_collection::testkit`,
//! the way naia ships a dedicated `test` crate for the same purpose; see
//! `DESIGN.md` for why this crate folds it into a module instead.

mod fake_cluster;

pub use fake_cluster::{ClusterNode, FakeCluster, FixedScheduler, RecordingTransport, SharedComm, SharedLocation};

use crate::migrate::MigrateHooks;

/// A minimal element type used across scenario tests: an `i64` payload with
/// the full complement of derives the ambient stack needs (ordering for
/// nothing here, `Clone`/`Debug` for assertions, `serde` for checkpoint and
/// migration).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counter(pub i64);

impl MigrateHooks for Counter {}
