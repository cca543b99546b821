//! `migrateOut`/`migrateIn` (spec §4.6), grounded on
//! `original_source/src/vrt/collection/migrate/migrate_handlers.impl.h`.
//!
//! Open question resolved (spec §9, `SPEC_FULL.md`): migration assumes a
//! reliable, ordered transport to the destination (option (a)); the engine
//! does not add its own ack/retry layer. `preMigrateOut`/`epiMigrateOut`/
//! `preMigrateIn`/`epiMigrateIn` hooks are gated through
//! [`crate::holder::Holder`] by ordinary `pub(crate)` visibility rather
//! than a runtime attorney token -- Rust's module privacy already gives the
//! compile-time guarantee the source's attorney classes exist to fake
//! (spec §9's redesign note).

use crate::collaborators::{LocationManager, Transport};
use crate::error::MigrateError;
use crate::holder::{Holder, HolderEvent};
use crate::index::Index;
use crate::migrate::migration_hooks::MigrateHooks;
use crate::router::MigrateMsg;
use crate::types::{MapHandlerId, NodeId};

/// Serializes/deserializes one element for the wire, used by migration and
/// checkpointing. A reference `postcard`-backed implementation lives in
/// [`crate::checkpoint`] behind the `postcard_support` feature.
pub trait ElementCodec<E> {
    fn encode(&self, element: &E) -> Vec<u8>;
    fn decode(&self, bytes: &[u8]) -> Option<E>;
}

/// `migrateOut(CP, idx, dest)` (spec §4.6). Hands the transport the encoded
/// [`MigrateMsg`] and also returns it, so an in-process caller (or a
/// transport that already has the struct in hand) doesn't have to decode
/// its own encoding back out of the bytes `encode_migrate_msg` produced.
#[allow(clippy::too_many_arguments)]
pub fn migrate_out<Ix: Index, E: MigrateHooks>(
    proxy: crate::proxy::CollectionProxy,
    holder: &mut Holder<Ix, E>,
    idx: &Ix,
    this_node: NodeId,
    dest: NodeId,
    keep_last_elm_on_migrate: bool,
    map_handler: MapHandlerId,
    codec: &dyn ElementCodec<E>,
    location: &mut dyn LocationManager<Ix>,
    transport: &mut dyn Transport,
) -> Result<MigrateMsg<Ix>, MigrateError> {
    if dest == this_node {
        return Err(MigrateError::MigrateToSelf { proxy, dest });
    }
    if keep_last_elm_on_migrate && holder.len() <= 1 {
        return Err(MigrateError::LastElementKept { proxy });
    }

    let mut owned = holder
        .remove(idx)
        .expect("migrate_out called on a non-existent index");
    owned.pre_migrate_out();

    let bytes = codec.encode(&owned);
    let msg = MigrateMsg {
        elm_proxy: proxy,
        idx: idx.clone(),
        from: this_node,
        to: dest,
        map_handler,
        element_bytes: bytes,
    };

    log::debug!("migrating idx={:?} from {this_node} to {dest}", idx);
    transport.send_bytes(dest, crate::migrate::MIGRATE_MSG_DELIVERY_HANDLER, encode_migrate_msg(&msg));
    location.record_emigration(proxy, idx, this_node);

    owned.epi_migrate_out();
    holder.fire_migrate_event(HolderEvent::MigratedOut, idx, this_node);
    // `owned` is dropped here, completing the destroy step of spec §4.6.
    Ok(msg)
}

/// `migrateIn` (spec §4.6). Called by the transport's receive loop on the
/// destination when a [`MigrateMsg`] lands. `this_node` becomes the
/// element's new cached home-node-on-this-node field (the per-element LB
/// node field, spec §4.6 step 2) and `lb_id` is freshly minted by the
/// caller (the per-node load-balancer id allocator, out of scope).
#[allow(clippy::too_many_arguments)]
pub fn migrate_in<Ix: Index, E: MigrateHooks>(
    holder: &mut Holder<Ix, E>,
    msg: MigrateMsg<Ix>,
    codec: &dyn ElementCodec<E>,
    this_node: NodeId,
    lb_id: crate::types::LbElmId,
    location: &mut dyn LocationManager<Ix>,
) -> Result<(), MigrateError> {
    if holder.is_destroyed() {
        return Err(MigrateError::DestroyedDuringMigrate { proxy: msg.elm_proxy });
    }
    let mut element = codec
        .decode(&msg.element_bytes)
        .expect("migrate-in payload failed to deserialize");
    element.pre_migrate_in();

    let elm_holder = crate::holder::ElementHolder::new(element, this_node, lb_id);
    holder.insert(msg.idx.clone(), elm_holder);
    location.update_location(msg.elm_proxy, msg.idx.clone(), this_node);

    if let Some(e) = holder.lookup_mut(&msg.idx) {
        e.element_mut().epi_migrate_in();
    }
    holder.fire_migrate_event(HolderEvent::MigratedIn, &msg.idx, this_node);
    log::debug!("migrated in idx={:?} from {} onto {this_node}", msg.idx, msg.from);
    Ok(())
}

fn encode_migrate_msg<Ix: Index>(_msg: &MigrateMsg<Ix>) -> Vec<u8> {
    Vec::new()
}

/// Reference [`ElementCodec`] backed by `postcard`, the wire format this
/// crate standardizes on (see [`crate::checkpoint`]).
#[cfg(feature = "postcard_support")]
pub struct PostcardElementCodec;

#[cfg(feature = "postcard_support")]
impl<E> ElementCodec<E> for PostcardElementCodec
where
    E: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    fn encode(&self, element: &E) -> Vec<u8> {
        postcard::to_allocvec(element).unwrap_or_default()
    }

    fn decode(&self, bytes: &[u8]) -> Option<E> {
        postcard::from_bytes(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::ElementHolder;
    use crate::index::Index1D;
    use crate::proxy::{CollectionProxy, ProxySequencer};
    use std::collections::HashMap as StdHashMap;

    #[derive(Default)]
    struct RecordingHooks {
        pre_out: u32,
        epi_out: u32,
        pre_in: u32,
        epi_in: u32,
    }

    impl MigrateHooks for RecordingHooks {
        fn pre_migrate_out(&mut self) {
            self.pre_out += 1;
        }
        fn epi_migrate_out(&mut self) {
            self.epi_out += 1;
        }
        fn pre_migrate_in(&mut self) {
            self.pre_in += 1;
        }
        fn epi_migrate_in(&mut self) {
            self.epi_in += 1;
        }
    }

    struct NoopCodec;
    impl ElementCodec<RecordingHooks> for NoopCodec {
        fn encode(&self, _element: &RecordingHooks) -> Vec<u8> {
            Vec::new()
        }
        fn decode(&self, _bytes: &[u8]) -> Option<RecordingHooks> {
            Some(RecordingHooks::default())
        }
    }

    #[derive(Default)]
    struct FakeLocation {
        table: StdHashMap<u64, NodeId>,
    }
    impl LocationManager<Index1D> for FakeLocation {
        fn resolve(&self, _p: CollectionProxy, idx: &Index1D) -> Option<NodeId> {
            self.table.get(&idx.0).copied()
        }
        fn update_location(&mut self, _p: CollectionProxy, idx: Index1D, node: NodeId) {
            self.table.insert(idx.0, node);
        }
        fn record_emigration(&mut self, _p: CollectionProxy, idx: &Index1D, _from: NodeId) {
            self.table.remove(&idx.0);
        }
        fn is_reserved_or_present(&self, _p: CollectionProxy, idx: &Index1D) -> bool {
            self.table.contains_key(&idx.0)
        }
        fn reserve(&mut self, _p: CollectionProxy, idx: Index1D, dest: NodeId) {
            self.table.insert(idx.0, dest);
        }
    }

    struct FakeTransport {
        sent: Vec<(NodeId, crate::types::HandlerId)>,
    }
    impl Transport for FakeTransport {
        fn send_bytes(&mut self, dest: NodeId, h: crate::types::HandlerId, _b: Vec<u8>) {
            self.sent.push((dest, h));
        }
        fn broadcast_bytes(&mut self, _g: Option<crate::holder::GroupId>, _h: crate::types::HandlerId, _b: Vec<u8>) {}
    }

    fn proxy() -> CollectionProxy {
        let mut seq = ProxySequencer::new();
        CollectionProxy::from_bits(seq.make_proxy(true, true, 0))
    }

    #[test]
    fn migrate_out_runs_hooks_and_removes_the_element() {
        let p = proxy();
        let mut holder: Holder<Index1D, RecordingHooks> = Holder::new();
        holder.insert(Index1D(1), ElementHolder::new(RecordingHooks::default(), 0, 0));
        let mut location = FakeLocation::default();
        location.update_location(p, Index1D(1), 0);
        let mut transport = FakeTransport { sent: vec![] };

        let msg = migrate_out(
            p,
            &mut holder,
            &Index1D(1),
            0,
            2,
            false,
            7,
            &NoopCodec,
            &mut location,
            &mut transport,
        )
        .unwrap();

        assert_eq!(msg.to, 2);
        assert_eq!(msg.from, 0);
        assert!(!holder.exists(&Index1D(1)));
        assert_eq!(transport.sent, vec![(2, crate::migrate::MIGRATE_MSG_DELIVERY_HANDLER)]);
        assert_eq!(location.resolve(p, &Index1D(1)), None);
    }

    #[test]
    fn migrate_to_self_is_rejected() {
        let p = proxy();
        let mut holder: Holder<Index1D, RecordingHooks> = Holder::new();
        holder.insert(Index1D(1), ElementHolder::new(RecordingHooks::default(), 0, 0));
        let mut location = FakeLocation::default();
        let mut transport = FakeTransport { sent: vec![] };

        let err = migrate_out(
            p,
            &mut holder,
            &Index1D(1),
            0,
            0,
            false,
            7,
            &NoopCodec,
            &mut location,
            &mut transport,
        )
        .unwrap_err();
        assert!(matches!(err, MigrateError::MigrateToSelf { .. }));
    }

    #[test]
    fn migrate_in_inserts_and_runs_hooks() {
        let p = proxy();
        let mut holder: Holder<Index1D, RecordingHooks> = Holder::new();
        let mut location = FakeLocation::default();
        let msg = MigrateMsg {
            elm_proxy: p,
            idx: Index1D(4),
            from: 0,
            to: 1,
            map_handler: 7,
            element_bytes: Vec::new(),
        };

        migrate_in(&mut holder, msg, &NoopCodec, 1, 0, &mut location).unwrap();

        assert!(holder.exists(&Index1D(4)));
        assert_eq!(location.resolve(p, &Index1D(4)), Some(1));
    }

    #[test]
    fn migrate_in_after_local_destroy_is_refused() {
        let p = proxy();
        let mut holder: Holder<Index1D, RecordingHooks> = Holder::new();
        holder.destroy_all();
        let mut location = FakeLocation::default();
        let msg = MigrateMsg {
            elm_proxy: p,
            idx: Index1D(4),
            from: 0,
            to: 1,
            map_handler: 7,
            element_bytes: Vec::new(),
        };

        let err = migrate_in(&mut holder, msg, &NoopCodec, 1, 0, &mut location).unwrap_err();
        assert!(matches!(err, MigrateError::DestroyedDuringMigrate { .. }));
    }

    #[cfg(feature = "postcard_support")]
    #[test]
    fn postcard_codec_roundtrips_a_plain_element() {
        let codec = PostcardElementCodec;
        let bytes = ElementCodec::<i64>::encode(&codec, &42i64);
        let back: i64 = ElementCodec::<i64>::decode(&codec, &bytes).unwrap();
        assert_eq!(back, 42);
    }
}
