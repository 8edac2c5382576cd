//! Reorder request and response types exchanged between clients and the
//! reorder authority.
//!
//! The JSON field names `position`, `lock_version`, `parent_id`, and
//! `repositioned_after_id` are the interchange contract and appear verbatim
//! on the wire. Every mutation carries the caller's last-observed
//! `lock_version`; the server rejects stale values with a conflict payload
//! containing the current authoritative state rather than merging.

use serde::{Deserialize, Serialize};

use crate::item::{ItemId, PositionedItem};

/// A single-item move request.
///
/// Either `repositioned_after_id` or an explicit `position` must be present.
/// `repositioned_after_id` set to the nil sentinel ([`ItemId::nil`]) means
/// "insert at the head of the list"; omitting the field means no relative
/// positioning was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositionRequest {
    /// The item being moved.
    pub item_id: ItemId,
    /// Sibling to land immediately after, or the nil sentinel for head-of-list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositioned_after_id: Option<ItemId>,
    /// Client-computed candidate position. Advisory: the server is the
    /// arbiter of the final stored order for single-item moves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    /// The `lock_version` the client last observed for the item.
    pub lock_version: u64,
}

impl RepositionRequest {
    /// Returns `true` if the request names neither an anchor nor a position.
    ///
    /// Such a request is malformed and must be rejected before any state
    /// mutation.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        self.repositioned_after_id.is_none() && self.position.is_none()
    }
}

/// One entry of a batch reorder: a computed position for a single item.
///
/// Batch entries carry client-computed keys produced by the position
/// calculator; the server stores them directly. A `parent_id` differing from
/// the addressed scope reparents the item into that scope as part of the
/// batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReposition {
    /// The item being positioned.
    pub id: ItemId,
    /// New order key, stored as submitted.
    pub position: i64,
    /// The `lock_version` the client last observed for the item.
    pub lock_version: u64,
    /// New parent scope, when the move also reparents the item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// An atomic multi-item reorder.
///
/// Either every entry commits together or none do: a version conflict on any
/// single item aborts the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReorderRequest {
    /// The moved items with their computed positions.
    pub items: Vec<ItemReposition>,
    /// The scope-level `lock_version` the client last observed, when the
    /// caller wants list-level staleness detected as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_version: Option<u64>,
}

/// Creation request for a new positioned item.
///
/// The client generates the id (offline-first creation). The initial
/// position is assigned server-side: after the named sibling, at the head
/// for the nil sentinel, or at the end of the list when no anchor is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItemRequest {
    /// Client-generated identifier for the new item.
    pub id: ItemId,
    /// Sibling to land immediately after, nil sentinel for head, absent for
    /// append-at-end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositioned_after_id: Option<ItemId>,
}

/// Scope-level rebalance request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    /// The scope-level `lock_version` the client last observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_version: Option<u64>,
}

/// Structured outcome of a reorder mutation.
///
/// Conflicts are a normal, expected result of concurrent editing — they
/// carry the current authoritative state so the client can resync and let
/// the user retry deliberately, and are kept distinct from "not found" and
/// "malformed" so the UI can react differently to each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReorderResponse {
    /// The mutation committed; the payload is the new canonical state.
    Applied {
        /// All items of the scope in canonical order.
        items: Vec<PositionedItem>,
        /// The scope-level version after the mutation.
        scope_version: u64,
    },
    /// A supplied `lock_version` was stale; nothing was applied.
    Conflict {
        /// The current authoritative items, for client resync.
        items: Vec<PositionedItem>,
        /// The current scope-level version.
        scope_version: u64,
    },
    /// The target item or scope no longer exists.
    NotFound {
        /// Identifier that failed to resolve.
        id: String,
    },
    /// The request was rejected before any state mutation.
    Invalid {
        /// Human-readable description of the malformation.
        reason: String,
    },
}
