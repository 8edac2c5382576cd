//! Positioned-item data model shared between Tasklane clients and the
//! reorder authority.
//!
//! An item's `position` is a sparse signed integer order key: only relative
//! order within a scope is meaningful, values are never required to be
//! contiguous, and negative keys are how head insertions avoid renumbering
//! existing items. Two items may transiently share a position (concurrent
//! clients picking the same key); the composite `(position, created_at, id)`
//! order resolves the tie deterministically.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a positioned item, based on UUID v7 for time-ordering.
///
/// The all-zero UUID is reserved as the head-of-list sentinel (see
/// [`ItemId::nil`]) and is never a real item reference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Creates a new time-ordered item identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an `ItemId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The reserved all-zero identifier.
    ///
    /// Used as `repositioned_after_id` to mean "insert at the head of the
    /// list", distinct from omitting the field (which means no relative
    /// positioning was requested). Every consumer of an after-id field must
    /// check [`is_nil`](Self::is_nil) before treating it as a real reference.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns `true` if this is the reserved head-of-list sentinel.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in an ordered, scope-local list.
///
/// Items are ordered only relative to siblings sharing the same `parent_id`;
/// cross-scope comparison is undefined. `lock_version` is the
/// optimistic-concurrency token: the server bumps it on every authoritative
/// mutation and rejects writes carrying a stale value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedItem {
    /// Stable identifier, unique within the parent scope.
    pub id: ItemId,
    /// Identifier of the list this item belongs to (e.g. a job's task list).
    pub parent_id: String,
    /// Sparse signed integer order key. May be negative.
    pub position: i64,
    /// Creation time in milliseconds since epoch; tie-breaker for equal positions.
    pub created_at: u64,
    /// Version counter, incremented on every authoritative mutation.
    pub lock_version: u64,
}

impl PositionedItem {
    /// Creates an item with a fresh `lock_version` of zero.
    #[must_use]
    pub fn new(id: ItemId, parent_id: String, position: i64, created_at: u64) -> Self {
        Self {
            id,
            parent_id,
            position,
            created_at,
            lock_version: 0,
        }
    }

    /// Composite ordering key.
    ///
    /// Everywhere items are displayed or iterated they must be ordered by
    /// this key, never by `position` alone: equal positions are a normal
    /// outcome of uncoordinated concurrent inserts.
    #[must_use]
    pub fn sort_key(&self) -> (i64, u64, ItemId) {
        (self.position, self.created_at, self.id)
    }
}

/// Sorts a scope's items into canonical display order.
pub fn sort_canonical(items: &mut [PositionedItem]) {
    items.sort_by_key(PositionedItem::sort_key);
}
