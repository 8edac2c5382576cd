//! Optimistic synchronization against the reorder authority.
//!
//! The controller applies moves to the local display order immediately,
//! packages them as reorder requests carrying last-observed versions, and
//! reconciles the authority's structured responses. A version conflict is
//! not a failure: it resolves into a full resync to the authoritative order.

pub mod controller;

pub use controller::{ListController, SyncOutcome};

use tasklane_proto::item::ItemId;
use thiserror::Error;

/// Errors surfaced by the sync controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The scope has not been loaded into this controller.
    #[error("scope not loaded: {0}")]
    ScopeNotFound(String),
    /// The item does not exist in the local view of the scope.
    #[error("item not found in local view: {0}")]
    ItemNotFound(ItemId),
    /// The requested display index is outside the scope's list.
    #[error("index {index} out of range for list of {len}")]
    IndexOutOfRange {
        /// Requested display index.
        index: usize,
        /// Current length of the list.
        len: usize,
    },
    /// No local moves are pending, so there is nothing to send.
    #[error("no pending moves to sync")]
    NothingToSync,
    /// The server reported that the target no longer exists.
    #[error("target no longer exists server-side: {0}")]
    TargetMissing(String),
    /// The server rejected the request before any state mutation.
    #[error("request rejected: {0}")]
    Rejected(String),
}
