//! Authoritative per-scope position store with optimistic concurrency.
//!
//! The store owns the canonical integer `position` and `lock_version` for
//! every item. Client-submitted candidate positions are advisory: explicit
//! single-item moves are renumbered with classic list-shift semantics and
//! relative (after-id) moves are derived from the authoritative neighbors,
//! while batch moves carrying computed keys are stored directly. Every
//! mutation validates the caller's last-observed versions first; a mismatch
//! aborts with the current authoritative state so the client can resync.
//!
//! Thread-safe via [`RwLock`]. Each mutating operation validates and applies
//! under a single write acquisition, so a batch either commits entirely or
//! leaves no partial effects.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use tasklane_proto::item::{ItemId, PositionedItem, sort_canonical};
use tasklane_proto::reorder::{BatchReorderRequest, RepositionRequest};

/// Default spacing between appended items.
const DEFAULT_SPACING: i64 = 10_000;

/// Default position for the first item of an empty scope.
const DEFAULT_INITIAL_POSITION: i64 = 10_000;

/// Default maximum number of entries accepted in one batch.
const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Errors surfaced by store mutations.
///
/// Conflicts carry the current authoritative state so the caller can resync;
/// they are a normal outcome of concurrent editing, distinct from "not
/// found" and from malformed requests (which are rejected before any state
/// mutation).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A supplied `lock_version` no longer matches the stored one.
    #[error("version conflict in scope {scope}")]
    Conflict {
        /// Scope in which the stale version was detected.
        scope: String,
        /// Current authoritative items, in canonical order.
        items: Vec<PositionedItem>,
        /// Current scope-level version.
        scope_version: u64,
    },
    /// The named scope does not exist.
    #[error("scope not found: {0}")]
    ScopeNotFound(String),
    /// The named item does not exist in its scope.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    /// The request was invalid and was rejected without side effects.
    #[error("malformed request: {0}")]
    Malformed(String),
}

/// One scope's items plus its list-level version counter.
#[derive(Debug, Default)]
struct ScopeState {
    items: HashMap<ItemId, PositionedItem>,
    version: u64,
}

impl ScopeState {
    /// All items in canonical `(position, created_at, id)` order.
    fn snapshot(&self) -> Vec<PositionedItem> {
        let mut items: Vec<PositionedItem> = self.items.values().cloned().collect();
        sort_canonical(&mut items);
        items
    }

    fn conflict(&self, scope: &str) -> StoreError {
        StoreError::Conflict {
            scope: scope.to_string(),
            items: self.snapshot(),
            scope_version: self.version,
        }
    }

    /// Opens a one-wide gap after `anchor` by shifting every later item up.
    fn open_gap_after(&mut self, anchor_key: (i64, u64, ItemId), skip: ItemId) {
        for item in self.items.values_mut() {
            if item.id != skip && item.sort_key() > anchor_key {
                item.position += 1;
                item.lock_version += 1;
            }
        }
    }

    /// Classic list-shift: everything between the old and new position moves
    /// by one in the opposite direction.
    fn shift_between(&mut self, moved: ItemId, old: i64, new: i64) {
        for item in self.items.values_mut() {
            if item.id == moved {
                continue;
            }
            if new > old && item.position > old && item.position <= new {
                item.position -= 1;
                item.lock_version += 1;
            } else if new < old && item.position >= new && item.position < old {
                item.position += 1;
                item.lock_version += 1;
            }
        }
    }
}

/// In-memory reorder authority over per-scope item lists.
pub struct ListStore {
    scopes: RwLock<HashMap<String, ScopeState>>,
    default_spacing: i64,
    initial_position: i64,
    max_batch_size: usize,
}

impl Default for ListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ListStore {
    /// Creates an empty store with default spacing and batch limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_SPACING,
            DEFAULT_INITIAL_POSITION,
            DEFAULT_MAX_BATCH_SIZE,
        )
    }

    /// Creates an empty store with custom spacing and batch limits.
    #[must_use]
    pub fn with_config(default_spacing: i64, initial_position: i64, max_batch_size: usize) -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            default_spacing: default_spacing.max(1),
            initial_position,
            max_batch_size,
        }
    }

    /// Returns the current timestamp in milliseconds since epoch.
    fn now_ms() -> u64 {
        u64::try_from(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        )
        .unwrap_or(u64::MAX)
    }

    /// Returns the scope's items in canonical order plus its version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ScopeNotFound`] if the scope does not exist.
    pub async fn snapshot(&self, scope: &str) -> Result<(Vec<PositionedItem>, u64), StoreError> {
        let scopes = self.scopes.read().await;
        let state = scopes
            .get(scope)
            .ok_or_else(|| StoreError::ScopeNotFound(scope.to_string()))?;
        Ok((state.snapshot(), state.version))
    }

    /// Creates a new item in the scope, assigning its initial position.
    ///
    /// `after` follows the anchor contract: `None` appends at the end, the
    /// nil sentinel inserts at the head, and a real id inserts immediately
    /// after that sibling. The scope is created on first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] for a nil or duplicate id, or
    /// [`StoreError::ItemNotFound`] for an unknown anchor.
    pub async fn create_item(
        &self,
        scope: &str,
        id: ItemId,
        after: Option<ItemId>,
    ) -> Result<(Vec<PositionedItem>, u64), StoreError> {
        if id.is_nil() {
            return Err(StoreError::Malformed(
                "the nil identifier is reserved".to_string(),
            ));
        }
        let mut scopes = self.scopes.write().await;
        let state = scopes.entry(scope.to_string()).or_default();
        if state.items.contains_key(&id) {
            return Err(StoreError::Malformed(format!("item already exists: {id}")));
        }

        let ordered = state.snapshot();
        let position = match after {
            None => ordered.last().map_or(self.initial_position, |last| {
                last.position.saturating_add(self.default_spacing)
            }),
            Some(anchor) if anchor.is_nil() => {
                ordered.first().map_or(self.initial_position, |first| {
                    first.position.saturating_sub(self.default_spacing)
                })
            }
            Some(anchor) => self.position_after(state, &ordered, anchor, id)?,
        };

        state
            .items
            .insert(id, PositionedItem::new(id, scope.to_string(), position, Self::now_ms()));
        state.version += 1;
        tracing::debug!(scope = %scope, item = %id, position, "item created");
        Ok((state.snapshot(), state.version))
    }

    /// Moves an item to an explicit integer position with classic
    /// list-shift semantics: every item between the old and new position is
    /// renumbered by one, so the submitted value is advisory rather than
    /// trusted as final truth.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ScopeNotFound`], [`StoreError::ItemNotFound`],
    /// or [`StoreError::Conflict`] when `lock_version` is stale.
    pub async fn move_to(
        &self,
        scope: &str,
        id: ItemId,
        position: i64,
        lock_version: u64,
    ) -> Result<(Vec<PositionedItem>, u64), StoreError> {
        let mut scopes = self.scopes.write().await;
        let state = scopes
            .get_mut(scope)
            .ok_or_else(|| StoreError::ScopeNotFound(scope.to_string()))?;
        let item = state.items.get(&id).ok_or(StoreError::ItemNotFound(id))?;
        if item.lock_version != lock_version {
            return Err(state.conflict(scope));
        }

        let old = item.position;
        state.shift_between(id, old, position);
        if let Some(item) = state.items.get_mut(&id) {
            item.position = position;
            item.lock_version += 1;
        }
        state.version += 1;
        tracing::debug!(scope = %scope, item = %id, from = old, to = position, "explicit move");
        Ok((state.snapshot(), state.version))
    }

    /// Applies a single-item reposition request.
    ///
    /// The anchor, when present, drives placement: the server derives the
    /// authoritative position from the anchor's current neighbors instead of
    /// trusting the client's provisional value. A request carrying only an
    /// explicit `position` falls back to [`move_to`](Self::move_to)
    /// semantics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] when the request names neither an
    /// anchor nor a position, [`StoreError::ScopeNotFound`],
    /// [`StoreError::ItemNotFound`], or [`StoreError::Conflict`].
    pub async fn reposition(
        &self,
        scope: &str,
        request: &RepositionRequest,
    ) -> Result<(Vec<PositionedItem>, u64), StoreError> {
        let anchor = match (request.repositioned_after_id, request.position) {
            (Some(anchor), _) => anchor,
            (None, Some(position)) => {
                return self
                    .move_to(scope, request.item_id, position, request.lock_version)
                    .await;
            }
            (None, None) => {
                return Err(StoreError::Malformed(
                    "reposition requires an anchor or a position".to_string(),
                ));
            }
        };
        if anchor == request.item_id {
            return Err(StoreError::Malformed(
                "an item cannot be anchored on itself".to_string(),
            ));
        }

        let mut scopes = self.scopes.write().await;
        let state = scopes
            .get_mut(scope)
            .ok_or_else(|| StoreError::ScopeNotFound(scope.to_string()))?;
        let item = state
            .items
            .get(&request.item_id)
            .ok_or(StoreError::ItemNotFound(request.item_id))?;
        if item.lock_version != request.lock_version {
            return Err(state.conflict(scope));
        }

        let mut ordered = state.snapshot();
        ordered.retain(|other| other.id != request.item_id);

        let position = if anchor.is_nil() {
            ordered.first().map_or(self.initial_position, |first| {
                first.position.saturating_sub(self.default_spacing)
            })
        } else {
            self.position_after(state, &ordered, anchor, request.item_id)?
        };

        if let Some(item) = state.items.get_mut(&request.item_id) {
            item.position = position;
            item.lock_version += 1;
        }
        state.version += 1;
        tracing::debug!(scope = %scope, item = %request.item_id, position, "relative move");
        Ok((state.snapshot(), state.version))
    }

    /// Applies a batch of computed positions atomically.
    ///
    /// Every entry's existence and `lock_version` (and the optional
    /// scope-level version) are validated before any mutation; a single
    /// stale entry aborts the whole batch with a conflict. Computed
    /// positions are stored directly. Entries naming a different
    /// `parent_id` are reparented into that scope as part of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] for an empty, oversized, or
    /// duplicate-carrying batch, [`StoreError::ScopeNotFound`],
    /// [`StoreError::ItemNotFound`], or [`StoreError::Conflict`].
    pub async fn apply_batch(
        &self,
        scope: &str,
        request: &BatchReorderRequest,
    ) -> Result<(Vec<PositionedItem>, u64), StoreError> {
        if request.items.is_empty() {
            return Err(StoreError::Malformed("empty batch".to_string()));
        }
        if request.items.len() > self.max_batch_size {
            return Err(StoreError::Malformed(format!(
                "batch of {} exceeds limit of {}",
                request.items.len(),
                self.max_batch_size
            )));
        }

        let mut scopes = self.scopes.write().await;

        // Validation pass: no mutation happens until everything checks out.
        {
            let state = scopes
                .get(scope)
                .ok_or_else(|| StoreError::ScopeNotFound(scope.to_string()))?;
            if let Some(expected) = request.scope_version {
                if expected != state.version {
                    return Err(state.conflict(scope));
                }
            }
            let mut seen = HashSet::new();
            for entry in &request.items {
                if !seen.insert(entry.id) {
                    return Err(StoreError::Malformed(format!(
                        "duplicate item in batch: {}",
                        entry.id
                    )));
                }
                let item = state
                    .items
                    .get(&entry.id)
                    .ok_or(StoreError::ItemNotFound(entry.id))?;
                if item.lock_version != entry.lock_version {
                    return Err(state.conflict(scope));
                }
                if let Some(target) = &entry.parent_id {
                    if target != scope
                        && scopes
                            .get(target)
                            .is_some_and(|t| t.items.contains_key(&entry.id))
                    {
                        return Err(StoreError::Malformed(format!(
                            "item already exists in scope {target}: {}",
                            entry.id
                        )));
                    }
                }
            }
        }

        // Apply pass.
        let mut reparented: Vec<(String, PositionedItem)> = Vec::new();
        let snapshot = {
            let state = scopes
                .get_mut(scope)
                .ok_or_else(|| StoreError::ScopeNotFound(scope.to_string()))?;
            for entry in &request.items {
                match entry.parent_id.as_deref() {
                    Some(target) if target != scope => {
                        if let Some(mut item) = state.items.remove(&entry.id) {
                            item.position = entry.position;
                            item.parent_id = target.to_string();
                            item.lock_version += 1;
                            reparented.push((target.to_string(), item));
                        }
                    }
                    _ => {
                        if let Some(item) = state.items.get_mut(&entry.id) {
                            item.position = entry.position;
                            item.lock_version += 1;
                        }
                    }
                }
            }
            state.version += 1;
            (state.snapshot(), state.version)
        };

        for (target, item) in reparented {
            let target_state = scopes.entry(target).or_default();
            target_state.items.insert(item.id, item);
            target_state.version += 1;
        }

        tracing::debug!(scope = %scope, entries = request.items.len(), "batch applied");
        Ok(snapshot)
    }

    /// Respaces every item in the scope evenly, restoring insertion
    /// headroom. All new values commit together.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ScopeNotFound`] or [`StoreError::Conflict`]
    /// when `scope_version` is stale.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn rebalance(
        &self,
        scope: &str,
        scope_version: Option<u64>,
    ) -> Result<(Vec<PositionedItem>, u64), StoreError> {
        let mut scopes = self.scopes.write().await;
        let state = scopes
            .get_mut(scope)
            .ok_or_else(|| StoreError::ScopeNotFound(scope.to_string()))?;
        if let Some(expected) = scope_version {
            if expected != state.version {
                return Err(state.conflict(scope));
            }
        }

        let ordered = state.snapshot();
        for (index, snap) in ordered.iter().enumerate() {
            let position = self.initial_position + (index as i64) * self.default_spacing;
            if let Some(item) = state.items.get_mut(&snap.id) {
                item.position = position;
                item.lock_version += 1;
            }
        }
        state.version += 1;
        tracing::info!(scope = %scope, count = ordered.len(), "scope rebalanced");
        Ok((state.snapshot(), state.version))
    }

    /// Derives the position for landing immediately after `anchor`:
    /// midpoint when an integer gap exists, append spacing at the tail,
    /// otherwise a one-wide gap is opened by shifting later items.
    fn position_after(
        &self,
        state: &mut ScopeState,
        ordered: &[PositionedItem],
        anchor: ItemId,
        moving: ItemId,
    ) -> Result<i64, StoreError> {
        let index = ordered
            .iter()
            .position(|item| item.id == anchor)
            .ok_or(StoreError::ItemNotFound(anchor))?;
        let anchor_item = &ordered[index];
        match ordered.get(index + 1) {
            None => Ok(anchor_item.position.saturating_add(self.default_spacing)),
            Some(next) => {
                let gap = next.position - anchor_item.position;
                if gap >= 2 {
                    Ok(anchor_item.position + gap.div_euclid(2))
                } else {
                    state.open_gap_after(anchor_item.sort_key(), moving);
                    Ok(anchor_item.position + 1)
                }
            }
        }
    }
}
