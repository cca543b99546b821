//! 64-bit collection proxy packing (spec §4.1), grounded on
//! `original_source/src/vrt/collection/types/type_aliases.h`'s
//! `VirtualProxyType = uint64_t` and `collection_manager.impl.h`'s
//! `makeNewCollectionProxy`, which packs
//! `(is_collective, is_migratable, creator_node, sequence)` highest bit
//! first.

use crate::types::{NodeId, SequenceId};

const COLLECTIVE_BIT: u64 = 1 << 63;
const MIGRATABLE_BIT: u64 = 1 << 62;
const NODE_BITS: u32 = 24;
const NODE_SHIFT: u32 = 62 - NODE_BITS;
const NODE_MASK: u64 = (1u64 << NODE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1u64 << NODE_SHIFT) - 1;

/// The reserved sentinel meaning "unset" (spec §3: "a reserved sentinel
/// `no_proxy`").
pub const NO_PROXY: u64 = u64::MAX;

/// Bit-packed encoding/decoding of a 64-bit collection proxy. Two proxies
/// compare/hash equal iff every bit is equal (spec §3 invariant).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ProxyBits(u64);

impl ProxyBits {
    /// Pack fresh proxy bits. `creator_node` is truncated to `NODE_BITS`
    /// and `sequence` to the remaining bits; the caller (see
    /// [`crate::proxy::ProxySequencer`]) is responsible for keeping
    /// `sequence` monotone and never reused within the process lifetime.
    pub fn new(
        is_collective: bool,
        is_migratable: bool,
        creator_node: NodeId,
        sequence: SequenceId,
    ) -> Self {
        let mut bits = 0u64;
        if is_collective {
            bits |= COLLECTIVE_BIT;
        }
        if is_migratable {
            bits |= MIGRATABLE_BIT;
        }
        bits |= (u64::from(creator_node) & NODE_MASK) << NODE_SHIFT;
        bits |= sequence & SEQUENCE_MASK;
        ProxyBits(bits)
    }

    pub fn from_raw(raw: u64) -> Self {
        ProxyBits(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_collective(self) -> bool {
        self.0 & COLLECTIVE_BIT != 0
    }

    pub fn is_migratable(self) -> bool {
        self.0 & MIGRATABLE_BIT != 0
    }

    /// The node that minted this proxy — used to bootstrap "home-of-proxy"
    /// lookups before the typeless registry has propagated (spec §4.1).
    pub fn creator_node(self) -> NodeId {
        ((self.0 >> NODE_SHIFT) & NODE_MASK) as NodeId
    }

    pub fn sequence(self) -> SequenceId {
        self.0 & SEQUENCE_MASK
    }

    pub fn is_no_proxy(self) -> bool {
        self.0 == NO_PROXY
    }

    pub fn no_proxy() -> Self {
        ProxyBits(NO_PROXY)
    }
}

/// Per-node monotone sequence allocator for proxy ids. Collective and
/// rooted construction draw from independent counters (spec §4.1: "collective-
/// constructed proxies use one counter, rooted use another"), matching the
/// split counters in `collection_manager.impl.h`.
#[derive(Debug, Default)]
pub struct ProxySequencer {
    collective_next: SequenceId,
    rooted_next: SequenceId,
}

impl ProxySequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically (within this node's single-threaded scheduler) consume
    /// the next sequence id and pack a fresh proxy.
    pub fn make_proxy(
        &mut self,
        is_collective: bool,
        is_migratable: bool,
        this_node: NodeId,
    ) -> ProxyBits {
        let seq = if is_collective {
            let s = self.collective_next;
            self.collective_next += 1;
            s
        } else {
            let s = self.rooted_next;
            self.rooted_next += 1;
            s
        };
        ProxyBits::new(is_collective, is_migratable, this_node, seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let p = ProxyBits::new(true, false, 7, 12345);
        assert!(p.is_collective());
        assert!(!p.is_migratable());
        assert_eq!(p.creator_node(), 7);
        assert_eq!(p.sequence(), 12345);
    }

    #[test]
    fn equality_is_full_bit_equality() {
        let a = ProxyBits::new(true, true, 1, 1);
        let b = ProxyBits::new(true, true, 1, 1);
        let c = ProxyBits::new(true, true, 1, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sequencer_never_repeats_and_is_per_kind() {
        let mut seq = ProxySequencer::new();
        let a = seq.make_proxy(true, false, 0);
        let b = seq.make_proxy(true, false, 0);
        let c = seq.make_proxy(false, false, 0);
        assert_ne!(a, b);
        assert_eq!(a.sequence(), 0);
        assert_eq!(b.sequence(), 1);
        // rooted counter is independent, so it also starts at 0
        assert_eq!(c.sequence(), 0);
    }

    #[test]
    fn no_proxy_sentinel() {
        let p = ProxyBits::no_proxy();
        assert!(p.is_no_proxy());
    }
}
