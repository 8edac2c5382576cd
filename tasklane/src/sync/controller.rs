//! Optimistic list controller: immediate local reorder, authoritative
//! reconcile.
//!
//! Holds a per-scope display-ordered view of positioned items. A move is
//! applied locally first (the UI updates without waiting for the network),
//! the provisional order key is computed from the new neighbors, and the
//! resulting request carries the versions the client last observed so the
//! server can detect staleness.

use std::collections::HashMap;

use tasklane_proto::item::{ItemId, PositionedItem, sort_canonical};
use tasklane_proto::reorder::{
    BatchReorderRequest, ItemReposition, ReorderResponse, RepositionRequest,
};

use super::SyncError;
use crate::positioning::{
    PositionConfig, REBALANCE_THRESHOLD, adjacent_items, calculate_position, needs_rebalancing,
    rebalance_positions,
};

/// What a server response did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The optimistic state was confirmed canonical.
    Applied,
    /// A version conflict forced a full resync to the server's order.
    Resynced,
}

/// Client-side view of one scope: display order plus observed versions.
#[derive(Debug, Default, Clone)]
struct ScopeView {
    /// Items in the order the UI currently displays them.
    items: Vec<PositionedItem>,
    /// Scope-level version last observed from the server.
    scope_version: u64,
    /// Items moved locally since the last successful sync, in move order.
    dirty: Vec<ItemId>,
}

/// Manages scope-local item lists with optimistic reordering.
#[derive(Debug, Default)]
pub struct ListController {
    scopes: HashMap<String, ScopeView>,
    config: PositionConfig,
}

impl ListController {
    /// Creates a controller with the default position configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PositionConfig::default())
    }

    /// Creates a controller with a custom position configuration.
    #[must_use]
    pub fn with_config(config: PositionConfig) -> Self {
        Self {
            scopes: HashMap::new(),
            config,
        }
    }

    /// Adopts an authoritative snapshot for a scope, replacing any local
    /// state and pending moves.
    pub fn load(&mut self, scope: &str, mut items: Vec<PositionedItem>, scope_version: u64) {
        sort_canonical(&mut items);
        self.scopes.insert(
            scope.to_string(),
            ScopeView {
                items,
                scope_version,
                dirty: Vec::new(),
            },
        );
    }

    /// Returns the scope's items in current display order.
    ///
    /// Returns an empty slice if the scope has not been loaded.
    #[must_use]
    pub fn items(&self, scope: &str) -> &[PositionedItem] {
        self.scopes.get(scope).map_or(&[], |view| &view.items)
    }

    /// Returns the scope-level version last observed from the server.
    #[must_use]
    pub fn scope_version(&self, scope: &str) -> Option<u64> {
        self.scopes.get(scope).map(|view| view.scope_version)
    }

    /// Moves an item to `target_index` in the display order, computing its
    /// provisional order key from the new neighbors.
    ///
    /// The local view updates immediately; the returned request carries the
    /// item's last-observed `lock_version` and the neighbor-derived anchor
    /// (nil sentinel when the item became the new head).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeNotFound`], [`SyncError::ItemNotFound`], or
    /// [`SyncError::IndexOutOfRange`].
    pub fn move_item(
        &mut self,
        scope: &str,
        item_id: ItemId,
        target_index: usize,
    ) -> Result<RepositionRequest, SyncError> {
        let view = self
            .scopes
            .get_mut(scope)
            .ok_or_else(|| SyncError::ScopeNotFound(scope.to_string()))?;
        let from = view
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(SyncError::ItemNotFound(item_id))?;
        if target_index >= view.items.len() {
            return Err(SyncError::IndexOutOfRange {
                index: target_index,
                len: view.items.len(),
            });
        }

        let moved = view.items.remove(from);
        view.items.insert(target_index, moved);

        let adj = adjacent_items(&view.items, target_index);
        let prev_pos = adj.prev.map(|p| p.position);
        let prev_id = adj.prev.map(|p| p.id);
        let next_pos = adj.next.map(|n| n.position);
        let new_position = calculate_position(prev_pos, next_pos, &self.config);

        let item = &mut view.items[target_index];
        item.position = new_position;
        let lock_version = item.lock_version;
        if !view.dirty.contains(&item_id) {
            view.dirty.push(item_id);
        }

        tracing::debug!(
            scope = %scope,
            item = %item_id,
            position = new_position,
            "optimistic move applied locally"
        );

        Ok(RepositionRequest {
            item_id,
            repositioned_after_id: Some(prev_id.unwrap_or(ItemId::nil())),
            position: Some(new_position),
            lock_version,
        })
    }

    /// Packages all pending local moves as an atomic batch request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeNotFound`] if the scope is not loaded, or
    /// [`SyncError::NothingToSync`] if no moves are pending.
    pub fn build_batch(&self, scope: &str) -> Result<BatchReorderRequest, SyncError> {
        let view = self
            .scopes
            .get(scope)
            .ok_or_else(|| SyncError::ScopeNotFound(scope.to_string()))?;
        if view.dirty.is_empty() {
            return Err(SyncError::NothingToSync);
        }
        let items = view
            .dirty
            .iter()
            .filter_map(|id| view.items.iter().find(|item| item.id == *id))
            .map(|item| ItemReposition {
                id: item.id,
                position: item.position,
                lock_version: item.lock_version,
                parent_id: None,
            })
            .collect();
        Ok(BatchReorderRequest {
            items,
            scope_version: Some(view.scope_version),
        })
    }

    /// Reconciles a server response into local state.
    ///
    /// `Applied` adopts the canonical items and versions; `Conflict`
    /// performs a full resync to the authoritative order — a conflict must
    /// never corrupt the visible order, and pending moves are discarded so
    /// the user can retry against fresh state.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeNotFound`] for an unloaded scope,
    /// [`SyncError::TargetMissing`] or [`SyncError::Rejected`] for the
    /// corresponding server outcomes.
    pub fn apply_response(
        &mut self,
        scope: &str,
        response: ReorderResponse,
    ) -> Result<SyncOutcome, SyncError> {
        if !self.scopes.contains_key(scope) {
            return Err(SyncError::ScopeNotFound(scope.to_string()));
        }
        match response {
            ReorderResponse::Applied {
                items,
                scope_version,
            } => {
                self.adopt(scope, items, scope_version);
                Ok(SyncOutcome::Applied)
            }
            ReorderResponse::Conflict {
                items,
                scope_version,
            } => {
                tracing::warn!(scope = %scope, "version conflict, resyncing to authoritative order");
                self.adopt(scope, items, scope_version);
                Ok(SyncOutcome::Resynced)
            }
            ReorderResponse::NotFound { id } => Err(SyncError::TargetMissing(id)),
            ReorderResponse::Invalid { reason } => Err(SyncError::Rejected(reason)),
        }
    }

    /// Returns `true` when the scope's order keys have converged too far for
    /// randomized insertion to keep working.
    #[must_use]
    pub fn needs_rebalancing(&self, scope: &str) -> bool {
        let Some(view) = self.scopes.get(scope) else {
            return false;
        };
        let mut positions: Vec<i64> = view.items.iter().map(|item| item.position).collect();
        positions.sort_unstable();
        needs_rebalancing(&positions, REBALANCE_THRESHOLD)
    }

    /// Proposes a batch that respaces every item in the scope evenly.
    ///
    /// The server applies the plan atomically; this only computes the values.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ScopeNotFound`] if the scope is not loaded.
    pub fn rebalance_plan(&self, scope: &str) -> Result<BatchReorderRequest, SyncError> {
        let view = self
            .scopes
            .get(scope)
            .ok_or_else(|| SyncError::ScopeNotFound(scope.to_string()))?;
        let positions = rebalance_positions(
            view.items.len(),
            self.config.initial_position,
            self.config.default_spacing,
        );
        let items = view
            .items
            .iter()
            .zip(positions)
            .map(|(item, position)| ItemReposition {
                id: item.id,
                position,
                lock_version: item.lock_version,
                parent_id: None,
            })
            .collect();
        Ok(BatchReorderRequest {
            items,
            scope_version: Some(view.scope_version),
        })
    }

    fn adopt(&mut self, scope: &str, mut items: Vec<PositionedItem>, scope_version: u64) {
        sort_canonical(&mut items);
        self.scopes.insert(
            scope.to_string(),
            ScopeView {
                items,
                scope_version,
                dirty: Vec::new(),
            },
        );
    }
}
