//! Tasklane — client-side list positioning and optimistic sync.
//!
//! The positioning module computes sparse integer order keys for items being
//! inserted or moved, designed so that many uncoordinated (including
//! offline) clients editing the same list rarely collide. The sync module
//! wraps it in an optimistic controller that applies moves locally before
//! the network round-trip and reconciles against the reorder authority's
//! responses.

pub mod positioning;
pub mod sync;
