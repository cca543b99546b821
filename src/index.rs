//! The user-typed, value-semantic collection index (spec §3, "Index (IX)").

use std::fmt::Debug;
use std::hash::Hash;

/// A user-typed collection index. Value-semantic, hashable, totally ordered,
/// and dense-enumerable over a bounding range.
///
/// Implementors provide collision-free bit packing (`unique_bits`) so the
/// index can stand in for a location-manager key or a load-balancer id
/// component, dimensionality (`ndims`), and a linearization into a flat
/// "base index" used by bounded default maps and checkpoint bucketing.
pub trait Index: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {
    /// Collision-free packing of this index into a single integer, used as a
    /// component of location-manager keys and for stable ordering.
    fn unique_bits(&self) -> u64;

    /// Number of dimensions this index type carries (1 for scalar indices).
    fn ndims(&self) -> u32;

    /// Enumerate every index in the dense sub-range `[self, range)`,
    /// inclusive of `self`, exclusive of `range`, invoking `f` for each one
    /// in row-major order. `range` must dominate `self` dimension-wise.
    fn foreach_in_range(&self, range: &Self, f: &mut dyn FnMut(Self));

    /// Linearize this index against `bounds` into a flat `0..bounds.len()`
    /// offset, used by default block/round-robin maps and checkpoint
    /// bucketing (`linearize` in spec §4.9).
    fn linearize(&self, bounds: &Self) -> u64;

    /// Total number of indices covered by `[0, bounds)`.
    fn extent(bounds: &Self) -> u64;

    /// Dot-joined textual form used for checkpoint element file names
    /// (spec §6, "dot-joined dimension components").
    fn to_dotted_string(&self) -> String;
}

/// A dense 1-dimensional index, the common case (spec scenarios S1-S5 all
/// use this shape).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Index1D(pub u64);

impl Index for Index1D {
    fn unique_bits(&self) -> u64 {
        self.0
    }

    fn ndims(&self) -> u32 {
        1
    }

    fn foreach_in_range(&self, range: &Self, f: &mut dyn FnMut(Self)) {
        for i in self.0..range.0 {
            f(Index1D(i));
        }
    }

    fn linearize(&self, _bounds: &Self) -> u64 {
        self.0
    }

    fn extent(bounds: &Self) -> u64 {
        bounds.0
    }

    fn to_dotted_string(&self) -> String {
        self.0.to_string()
    }
}

/// A dense 2-dimensional index (row-major), used by multi-dimensional
/// collections.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Index2D(pub u64, pub u64);

impl Index for Index2D {
    fn unique_bits(&self) -> u64 {
        (self.0 << 32) | (self.1 & 0xFFFF_FFFF)
    }

    fn ndims(&self) -> u32 {
        2
    }

    fn foreach_in_range(&self, range: &Self, f: &mut dyn FnMut(Self)) {
        for x in self.0..range.0 {
            for y in self.1..range.1 {
                f(Index2D(x, y));
            }
        }
    }

    fn linearize(&self, bounds: &Self) -> u64 {
        self.0 * bounds.1 + self.1
    }

    fn extent(bounds: &Self) -> u64 {
        bounds.0 * bounds.1
    }

    fn to_dotted_string(&self) -> String {
        format!("{}.{}", self.0, self.1)
    }
}
