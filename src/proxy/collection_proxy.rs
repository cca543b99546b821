//! The opaque collection handle users hold (spec §3, "Collection proxy
//! (CP)"), plus the element-proxy pair.
//!
//! Per spec §9's redesign note, the template mix-in chains
//! (`Sendable`/`Broadcastable`/`Reducable`/`Insertable`) are replaced by a
//! single flat type whose capability methods (defined in
//! [`crate::router`], [`crate::reduce`], [`crate::migrate`],
//! [`crate::insert`]) are simply gated by the flags captured here at
//! construction time.

use crate::index::Index;
use crate::proxy::bits::ProxyBits;
use crate::types::NodeId;

/// An opaque handle to one distributed collection. Equality/hashing/
/// ordering are defined on the packed 64-bit value (spec §3 invariant).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CollectionProxy {
    bits: ProxyBits,
}

impl CollectionProxy {
    pub fn from_bits(bits: ProxyBits) -> Self {
        CollectionProxy { bits }
    }

    pub fn bits(self) -> ProxyBits {
        self.bits
    }

    pub fn no_proxy() -> Self {
        CollectionProxy {
            bits: ProxyBits::no_proxy(),
        }
    }

    pub fn is_no_proxy(self) -> bool {
        self.bits.is_no_proxy()
    }

    pub fn is_collective(self) -> bool {
        self.bits.is_collective()
    }

    pub fn is_migratable(self) -> bool {
        self.bits.is_migratable()
    }

    /// The node used as the stamping root for point-broadcasts (spec §4.4):
    /// the proxy's creator node.
    pub fn broadcast_root(self) -> NodeId {
        self.bits.creator_node()
    }

    /// Address one element of this collection.
    pub fn elm<Ix: Index>(self, idx: Ix) -> ElementProxy<Ix> {
        ElementProxy { proxy: self, idx }
    }
}

/// A `(CollectionProxy, Index)` pair addressing one element (spec §3).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ElementProxy<Ix: Index> {
    pub proxy: CollectionProxy,
    pub idx: Ix,
}

impl<Ix: Index> ElementProxy<Ix> {
    pub fn new(proxy: CollectionProxy, idx: Ix) -> Self {
        ElementProxy { proxy, idx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Index1D;

    #[test]
    fn element_proxy_pairs_collection_and_index() {
        let cp = CollectionProxy::from_bits(ProxyBits::new(true, false, 0, 3));
        let elm = cp.elm(Index1D(9));
        assert_eq!(elm.proxy, cp);
        assert_eq!(elm.idx, Index1D(9));
    }
}
