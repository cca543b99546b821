//! `beginModification`/`finishModification` epoch token (spec §4.7).

use crate::types::ModEpochId;

/// Returned by `beginModification`, required by every `insert`/`destroyElm`/
/// `finishModification` call for the epoch it opened. Deliberately opaque:
/// user code cannot mint one except by opening a modification epoch.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ModificationToken {
    epoch: ModEpochId,
}

impl ModificationToken {
    pub(crate) fn new(epoch: ModEpochId) -> Self {
        ModificationToken { epoch }
    }

    pub fn epoch(self) -> ModEpochId {
        self.epoch
    }
}
