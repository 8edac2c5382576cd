//! Tasklane reorder authority — canonical list positions over HTTP.
//!
//! Owns the durable integer `position` and `lock_version` per item, scoped
//! per parent list. Clients compute positions optimistically; this server
//! validates their last-observed versions, applies authoritative position
//! changes, and returns the canonical state (or a conflict payload carrying
//! it) for reconciliation.

pub mod config;
pub mod http;
pub mod store;
