//! Client-side catalog synchronization engine.
//!
//! Front-end shells embed this engine to keep a locally-ordered listing set
//! consistent with the server's authoritative filtered views. The engine owns
//! four concerns: the catalog state store (master order + displayed set), the
//! query debouncer and request arbiter, the local/remote reconciliation
//! policy, and the pagination slicer. The batch curation workflow for
//! administrators is layered on top of the same remote boundary.
//!
//! Everything here is transport-generic over [`RemoteCatalog`]; the HTTP
//! implementation targets this crate's own REST surface.

mod curation;
mod engine;
mod pager;
mod reconcile;
mod remote;
mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use curation::*;
pub use engine::*;
pub use pager::*;
pub use reconcile::*;
pub use remote::*;
pub use store::*;
