//! Per-element metadata and ownership (spec §3, "ElementHolder").

use crate::types::{LbElmId, NodeId};

/// Owns one element object plus its per-element bookkeeping. `erased` is
/// used to defer physical removal from the enclosing [`crate::holder::Holder`]
/// while a `foreach` iterator is live (spec §3, §4.3).
pub struct ElementHolder<E> {
    element: Option<Box<E>>,
    home_node: NodeId,
    lb_id: LbElmId,
    /// Per-element monotone reduce-stamp counter (spec §3 invariant 5).
    reduce_stamp: u64,
    erased: bool,
}

impl<E> ElementHolder<E> {
    pub fn new(element: E, home_node: NodeId, lb_id: LbElmId) -> Self {
        ElementHolder {
            element: Some(Box::new(element)),
            home_node,
            lb_id,
            reduce_stamp: 0,
            erased: false,
        }
    }

    pub fn element(&self) -> &E {
        self.element
            .as_ref()
            .expect("element() called on an erased ElementHolder")
    }

    pub fn element_mut(&mut self) -> &mut E {
        self.element
            .as_mut()
            .expect("element_mut() called on an erased ElementHolder")
    }

    pub fn home_node(&self) -> NodeId {
        self.home_node
    }

    pub fn lb_id(&self) -> LbElmId {
        self.lb_id
    }

    pub fn reduce_stamp(&self) -> u64 {
        self.reduce_stamp
    }

    pub fn set_reduce_stamp(&mut self, stamp: u64) {
        self.reduce_stamp = stamp;
    }

    /// Allocate the next reduce stamp for a contribution from this element
    /// (spec §3 invariant 5: strictly increasing).
    pub fn next_reduce_stamp(&mut self) -> u64 {
        self.reduce_stamp += 1;
        self.reduce_stamp
    }

    pub fn is_erased(&self) -> bool {
        self.erased
    }

    /// Mark as erased and hand back ownership of the element (used by
    /// `Holder::remove` and migrate-out).
    pub fn take_erasing(&mut self) -> Box<E> {
        self.erased = true;
        self.element
            .take()
            .expect("take_erasing() called twice on the same ElementHolder")
    }
}
