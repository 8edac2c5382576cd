//! Integration tests for the optimistic reorder flow: the client controller
//! computing provisional positions, the authoritative store applying them,
//! and the controller reconciling the canonical response.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use tasklane::sync::{ListController, SyncOutcome};
use tasklane_proto::item::{ItemId, PositionedItem};
use tasklane_server::http;
use tasklane_server::store::ListStore;

const SCOPE: &str = "job-1";

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Seeds a store with `count` appended items and returns their ids in order.
async fn seeded_store(count: usize) -> (ListStore, Vec<ItemId>) {
    let store = ListStore::new();
    let mut ids = Vec::new();
    for _ in 0..count {
        let id = ItemId::new();
        store.create_item(SCOPE, id, None).await.unwrap();
        ids.push(id);
    }
    (store, ids)
}

/// Loads a fresh controller from the store's current snapshot.
async fn load_controller(store: &ListStore) -> ListController {
    let (items, version) = store.snapshot(SCOPE).await.unwrap();
    let mut controller = ListController::new();
    controller.load(SCOPE, items, version);
    controller
}

fn ids_of(items: &[PositionedItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

// ---------------------------------------------------------------------------
// Batch flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optimistic_move_is_confirmed_by_batch_apply() {
    let (store, ids) = seeded_store(4).await;
    let mut controller = load_controller(&store).await;

    controller.move_item(SCOPE, ids[3], 1).unwrap();
    let optimistic_order = ids_of(controller.items(SCOPE));
    assert_eq!(optimistic_order, vec![ids[0], ids[3], ids[1], ids[2]]);

    let batch = controller.build_batch(SCOPE).unwrap();
    let (_, response) = http::respond(store.apply_batch(SCOPE, &batch).await);
    let outcome = controller.apply_response(SCOPE, response).unwrap();
    assert_eq!(outcome, SyncOutcome::Applied);

    // The confirmed canonical order matches what the user already saw.
    assert_eq!(ids_of(controller.items(SCOPE)), optimistic_order);

    // Client state equals the authoritative snapshot, versions included.
    let (canonical, version) = store.snapshot(SCOPE).await.unwrap();
    assert_eq!(controller.items(SCOPE), canonical.as_slice());
    assert_eq!(controller.scope_version(SCOPE), Some(version));
}

#[tokio::test]
async fn moved_item_gets_its_version_bumped() {
    let (store, ids) = seeded_store(3).await;
    let mut controller = load_controller(&store).await;

    controller.move_item(SCOPE, ids[0], 2).unwrap();
    let batch = controller.build_batch(SCOPE).unwrap();
    assert_eq!(batch.items[0].lock_version, 0);

    let (_, response) = http::respond(store.apply_batch(SCOPE, &batch).await);
    controller.apply_response(SCOPE, response).unwrap();

    let moved = controller
        .items(SCOPE)
        .iter()
        .find(|item| item.id == ids[0])
        .unwrap();
    assert_eq!(moved.lock_version, 1);
}

#[tokio::test]
async fn two_local_moves_commit_as_one_batch() {
    let (store, ids) = seeded_store(4).await;
    let mut controller = load_controller(&store).await;

    controller.move_item(SCOPE, ids[3], 0).unwrap();
    controller.move_item(SCOPE, ids[2], 1).unwrap();
    let optimistic_order = ids_of(controller.items(SCOPE));

    let batch = controller.build_batch(SCOPE).unwrap();
    assert_eq!(batch.items.len(), 2);

    let (_, response) = http::respond(store.apply_batch(SCOPE, &batch).await);
    assert_eq!(
        controller.apply_response(SCOPE, response).unwrap(),
        SyncOutcome::Applied
    );
    assert_eq!(ids_of(controller.items(SCOPE)), optimistic_order);
}

// ---------------------------------------------------------------------------
// Single-item flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn head_move_round_trips_through_the_nil_sentinel() {
    let (store, ids) = seeded_store(3).await;
    let mut controller = load_controller(&store).await;

    let request = controller.move_item(SCOPE, ids[2], 0).unwrap();
    assert_eq!(request.repositioned_after_id, Some(ItemId::nil()));
    assert!(request.position.unwrap() < 0);

    let (_, response) = http::respond(store.reposition(SCOPE, &request).await);
    controller.apply_response(SCOPE, response).unwrap();

    // The server derived its own head key; the item is still first.
    assert_eq!(controller.items(SCOPE)[0].id, ids[2]);
    let (canonical, _) = store.snapshot(SCOPE).await.unwrap();
    assert_eq!(canonical[0].id, ids[2]);
}

#[tokio::test]
async fn middle_move_round_trips_through_its_anchor() {
    let (store, ids) = seeded_store(3).await;
    let mut controller = load_controller(&store).await;

    let request = controller.move_item(SCOPE, ids[0], 1).unwrap();
    assert_eq!(request.repositioned_after_id, Some(ids[1]));

    let (_, response) = http::respond(store.reposition(SCOPE, &request).await);
    controller.apply_response(SCOPE, response).unwrap();
    assert_eq!(
        ids_of(controller.items(SCOPE)),
        vec![ids[1], ids[0], ids[2]]
    );
}

#[tokio::test]
async fn tail_move_round_trips_through_the_last_anchor() {
    let (store, ids) = seeded_store(3).await;
    let mut controller = load_controller(&store).await;

    let request = controller.move_item(SCOPE, ids[0], 2).unwrap();
    assert_eq!(request.repositioned_after_id, Some(ids[2]));

    let (_, response) = http::respond(store.reposition(SCOPE, &request).await);
    controller.apply_response(SCOPE, response).unwrap();
    assert_eq!(
        ids_of(controller.items(SCOPE)),
        vec![ids[1], ids[2], ids[0]]
    );
}

// ---------------------------------------------------------------------------
// Creation flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_items_load_in_insertion_order() {
    let (store, ids) = seeded_store(2).await;
    let head = ItemId::new();
    store
        .create_item(SCOPE, head, Some(ItemId::nil()))
        .await
        .unwrap();
    let wedged = ItemId::new();
    store.create_item(SCOPE, wedged, Some(ids[0])).await.unwrap();

    let controller = load_controller(&store).await;
    assert_eq!(
        ids_of(controller.items(SCOPE)),
        vec![head, ids[0], wedged, ids[1]]
    );
}

#[tokio::test]
async fn empty_scope_snapshot_round_trips() {
    let store = ListStore::new();
    let id = ItemId::new();
    let (items, version) = store.create_item(SCOPE, id, None).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].position, 10_000);
    assert_eq!(version, 1);

    let mut controller = ListController::new();
    controller.load(SCOPE, items, version);
    assert_eq!(controller.items(SCOPE)[0].id, id);
}
