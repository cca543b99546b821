//! Proxy/address space (spec §4.1): bit-packed collection ids and the
//! element-proxy pair that addresses one element.

mod bits;
mod collection_proxy;

pub use bits::{ProxyBits, ProxySequencer, NO_PROXY};
pub use collection_proxy::{CollectionProxy, ElementProxy};
