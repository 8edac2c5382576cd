//! Integration tests for version-conflict handling: stale writers are
//! rejected with the authoritative state, resync restores a consistent
//! view, and the distinct failure outcomes stay distinguishable.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use tasklane::sync::{ListController, SyncError, SyncOutcome};
use tasklane_proto::item::{ItemId, PositionedItem};
use tasklane_proto::reorder::{ReorderResponse, RepositionRequest};
use tasklane_server::http;
use tasklane_server::store::ListStore;

const SCOPE: &str = "job-1";

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

async fn load_controller(store: &ListStore) -> ListController {
    let (items, version) = store.snapshot(SCOPE).await.unwrap();
    let mut controller = ListController::new();
    controller.load(SCOPE, items, version);
    controller
}

fn ids_of(items: &[PositionedItem]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn stale_writer_conflicts_and_resyncs_to_authoritative_order() {
    let (store, ids) = seeded_store(3).await;
    let mut first_writer = load_controller(&store).await;
    let mut second_writer = load_controller(&store).await;

    // The first writer commits a move; versions advance server-side.
    first_writer.move_item(SCOPE, ids[0], 2).unwrap();
    let batch = first_writer.build_batch(SCOPE).unwrap();
    let (_, response) = http::respond(store.apply_batch(SCOPE, &batch).await);
    first_writer.apply_response(SCOPE, response).unwrap();

    // The second writer still holds the old versions; its move must bounce.
    second_writer.move_item(SCOPE, ids[0], 1).unwrap();
    let stale_batch = second_writer.build_batch(SCOPE).unwrap();
    let (_, response) = http::respond(store.apply_batch(SCOPE, &stale_batch).await);
    assert!(matches!(response, ReorderResponse::Conflict { .. }));

    let outcome = second_writer.apply_response(SCOPE, response).unwrap();
    assert_eq!(outcome, SyncOutcome::Resynced);

    // After resync the stale writer sees exactly the authoritative state.
    let (canonical, version) = store.snapshot(SCOPE).await.unwrap();
    assert_eq!(second_writer.items(SCOPE), canonical.as_slice());
    assert_eq!(second_writer.scope_version(SCOPE), Some(version));
    assert_eq!(ids_of(&canonical), vec![ids[1], ids[2], ids[0]]);
}

#[tokio::test]
async fn conflict_leaves_the_store_untouched() {
    let (store, ids) = seeded_store(3).await;
    let mut stale_writer = load_controller(&store).await;

    // Another client bumps the item's version behind our back.
    store.move_to(SCOPE, ids[1], 25_000, 0).await.unwrap();
    let (before, before_version) = store.snapshot(SCOPE).await.unwrap();

    stale_writer.move_item(SCOPE, ids[1], 0).unwrap();
    let batch = stale_writer.build_batch(SCOPE).unwrap();
    let (_, response) = http::respond(store.apply_batch(SCOPE, &batch).await);
    assert!(matches!(response, ReorderResponse::Conflict { .. }));

    let (after, after_version) = store.snapshot(SCOPE).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after_version, before_version);
}

#[tokio::test]
async fn retry_after_resync_succeeds() {
    let (store, ids) = seeded_store(3).await;
    let mut winner = load_controller(&store).await;
    let mut loser = load_controller(&store).await;

    winner.move_item(SCOPE, ids[2], 0).unwrap();
    let (_, response) = http::respond(
        store
            .apply_batch(SCOPE, &winner.build_batch(SCOPE).unwrap())
            .await,
    );
    winner.apply_response(SCOPE, response).unwrap();

    // First attempt bounces, resync adopts fresh versions.
    loser.move_item(SCOPE, ids[0], 2).unwrap();
    let (_, response) = http::respond(
        store
            .apply_batch(SCOPE, &loser.build_batch(SCOPE).unwrap())
            .await,
    );
    assert_eq!(
        loser.apply_response(SCOPE, response).unwrap(),
        SyncOutcome::Resynced
    );

    // The deliberate retry now carries current versions and lands.
    loser.move_item(SCOPE, ids[0], 2).unwrap();
    let (_, response) = http::respond(
        store
            .apply_batch(SCOPE, &loser.build_batch(SCOPE).unwrap())
            .await,
    );
    assert_eq!(
        loser.apply_response(SCOPE, response).unwrap(),
        SyncOutcome::Applied
    );
    let (canonical, _) = store.snapshot(SCOPE).await.unwrap();
    assert_eq!(ids_of(&canonical).last(), Some(&ids[0]));
}

#[tokio::test]
async fn scope_level_version_guards_unrelated_moves() {
    let (store, ids) = seeded_store(3).await;
    let mut observer = load_controller(&store).await;

    // A different item moves to the head, which touches no other item's
    // version but advances the scope version.
    let head_move = RepositionRequest {
        item_id: ids[2],
        repositioned_after_id: Some(ItemId::nil()),
        position: None,
        lock_version: 0,
    };
    store.reposition(SCOPE, &head_move).await.unwrap();

    // The observer's item version is still current, but its view of the
    // list as a whole is stale — the batch must bounce on the scope check.
    observer.move_item(SCOPE, ids[0], 1).unwrap();
    let batch = observer.build_batch(SCOPE).unwrap();
    let (_, response) = http::respond(store.apply_batch(SCOPE, &batch).await);
    assert!(matches!(response, ReorderResponse::Conflict { .. }));
}

#[tokio::test]
async fn unknown_target_surfaces_as_not_found() {
    let (store, _) = seeded_store(1).await;
    let mut controller = load_controller(&store).await;

    let ghost = RepositionRequest {
        item_id: ItemId::new(),
        repositioned_after_id: Some(ItemId::nil()),
        position: None,
        lock_version: 0,
    };
    let (_, response) = http::respond(store.reposition(SCOPE, &ghost).await);
    assert!(matches!(response, ReorderResponse::NotFound { .. }));

    let err = controller.apply_response(SCOPE, response).unwrap_err();
    assert!(matches!(err, SyncError::TargetMissing(_)));
}

#[tokio::test]
async fn unknown_scope_surfaces_as_not_found() {
    let store = ListStore::new();
    let (_, response) = http::respond(store.snapshot("nowhere").await);
    assert!(matches!(response, ReorderResponse::NotFound { .. }));
}

#[tokio::test]
async fn malformed_request_surfaces_as_rejected() {
    let (store, ids) = seeded_store(1).await;
    let mut controller = load_controller(&store).await;

    let empty = RepositionRequest {
        item_id: ids[0],
        repositioned_after_id: None,
        position: None,
        lock_version: 0,
    };
    let (_, response) = http::respond(store.reposition(SCOPE, &empty).await);
    assert!(matches!(response, ReorderResponse::Invalid { .. }));

    let err = controller.apply_response(SCOPE, response).unwrap_err();
    assert!(matches!(err, SyncError::Rejected(_)));

    // Rejection before mutation: the store is untouched.
    let (items, version) = store.snapshot(SCOPE).await.unwrap();
    assert_eq!(items[0].lock_version, 0);
    assert_eq!(version, 1);
}
