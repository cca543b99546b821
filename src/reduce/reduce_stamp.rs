//! Opaque monotone reduce-stamp type (spec §9: "Reduce-stamp as
//! incrementable strong typedef -> an opaque monotone counter type with
//! `next()` and total order").

/// Discriminates distinct reduction waves so partial contributions align
//  (spec glossary, "Reduce stamp").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ReduceStamp(u64);

impl ReduceStamp {
    /// The sentinel stamp newly inserted elements are seeded with before
    /// `finishModification` reconciles them (spec §4.7).
    pub const SENTINEL: ReduceStamp = ReduceStamp(0);

    pub fn from_raw(raw: u64) -> Self {
        ReduceStamp(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_sentinel(self) -> bool {
        self.0 == 0
    }

    pub fn next(self) -> Self {
        ReduceStamp(self.0 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_zero_and_ordered() {
        assert!(ReduceStamp::SENTINEL.is_sentinel());
        assert!(ReduceStamp::SENTINEL < ReduceStamp::from_raw(1));
        assert_eq!(ReduceStamp::from_raw(5).next().raw(), 6);
    }
}
