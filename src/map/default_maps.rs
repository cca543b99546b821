//! Default maps provided per index dimensionality (spec §4.2, §4.8 step 1:
//! "Pick default map if user gave none (bounded -> per-dim default;
//! unbounded -> object-group default)").

use crate::index::{Index, Index1D, Index2D};
use crate::map::map_resolver::MapFn;
use crate::types::NodeId;

/// Contiguous block partitioning over a bounded 1D range: node `n` owns
/// `ceil(extent / num_nodes)`-sized contiguous chunks. This is the default
/// for bounded collections (spec scenarios S1/S2 use it: "node k owns
/// indices {2k, 2k+1}" on an 8-element range over 4 nodes).
pub struct BlockMap;

impl MapFn<Index1D> for BlockMap {
    fn map(&self, idx: &Index1D, bounds: Option<&Index1D>, num_nodes: NodeId) -> NodeId {
        let bounds = bounds.expect("BlockMap requires bounds");
        let extent = Index1D::extent(bounds).max(1);
        let chunk = extent.div_ceil(u64::from(num_nodes).max(1));
        let chunk = chunk.max(1);
        ((idx.0 / chunk) as NodeId).min(num_nodes.saturating_sub(1))
    }
}

/// Row-major block partitioning for 2D bounds: linearizes then applies the
/// same contiguous-chunk rule as [`BlockMap`].
pub struct BlockMap2D;

impl MapFn<Index2D> for BlockMap2D {
    fn map(&self, idx: &Index2D, bounds: Option<&Index2D>, num_nodes: NodeId) -> NodeId {
        let bounds = bounds.expect("BlockMap2D requires bounds");
        let extent = Index2D::extent(bounds).max(1);
        let chunk = extent.div_ceil(u64::from(num_nodes).max(1)).max(1);
        let linear = idx.linearize(bounds);
        ((linear / chunk) as NodeId).min(num_nodes.saturating_sub(1))
    }
}

/// Round-robin over a bounded 1D range: `idx % num_nodes`.
pub struct RoundRobinMap;

impl MapFn<Index1D> for RoundRobinMap {
    fn map(&self, idx: &Index1D, _bounds: Option<&Index1D>, num_nodes: NodeId) -> NodeId {
        (idx.0 % u64::from(num_nodes).max(1)) as NodeId
    }
}

/// Default for unbounded (dynamic-membership) collections: hashes the
/// index's `unique_bits()` to a node. Deterministic and pure, matching
/// spec §4.2's requirement, without needing a real bounding range.
pub struct HashMap<Ix: Index>(std::marker::PhantomData<Ix>);

impl<Ix: Index> HashMap<Ix> {
    pub fn new() -> Self {
        HashMap(std::marker::PhantomData)
    }
}

impl<Ix: Index> Default for HashMap<Ix> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ix: Index> MapFn<Ix> for HashMap<Ix> {
    fn map(&self, idx: &Ix, _bounds: Option<&Ix>, num_nodes: NodeId) -> NodeId {
        (idx.unique_bits() % u64::from(num_nodes).max(1)) as NodeId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_map_matches_scenario_s1() {
        let bounds = Index1D(8);
        let map = BlockMap;
        for k in 0..4u32 {
            for j in 0..2u64 {
                let idx = Index1D(u64::from(k) * 2 + j);
                assert_eq!(map.map(&idx, Some(&bounds), 4), k);
            }
        }
    }

    #[test]
    fn round_robin_wraps() {
        let map = RoundRobinMap;
        assert_eq!(map.map(&Index1D(0), None, 4), 0);
        assert_eq!(map.map(&Index1D(5), None, 4), 1);
    }

    #[test]
    fn hash_map_is_pure_function_of_inputs() {
        let map: HashMap<Index1D> = HashMap::new();
        let a = map.map(&Index1D(42), None, 6);
        let b = map.map(&Index1D(42), None, 6);
        assert_eq!(a, b);
    }
}
