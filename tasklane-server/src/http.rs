//! HTTP surface for the reorder authority.
//!
//! A small axum JSON API over [`ListStore`]. Every mutation returns a
//! [`ReorderResponse`] body; the HTTP status mirrors the outcome so plain
//! clients can branch without parsing (200 applied, 409 conflict, 404 not
//! found, 422 malformed).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::task::JoinHandle;

use tasklane_proto::item::PositionedItem;
use tasklane_proto::reorder::{
    BatchReorderRequest, CreateItemRequest, RebalanceRequest, ReorderResponse, RepositionRequest,
};

use crate::store::{ListStore, StoreError};

/// Builds the reorder authority router over the given store.
#[must_use]
pub fn router(store: Arc<ListStore>) -> Router {
    Router::new()
        .route("/scopes/{scope}", get(get_scope))
        .route("/scopes/{scope}/items", post(create_item))
        .route("/scopes/{scope}/reorder", post(reorder))
        .route("/scopes/{scope}/reorder/batch", post(reorder_batch))
        .route("/scopes/{scope}/rebalance", post(rebalance))
        .with_state(store)
}

/// Maps a store outcome onto a wire response and HTTP status.
#[must_use]
pub fn respond(
    result: Result<(Vec<PositionedItem>, u64), StoreError>,
) -> (StatusCode, ReorderResponse) {
    match result {
        Ok((items, scope_version)) => (
            StatusCode::OK,
            ReorderResponse::Applied {
                items,
                scope_version,
            },
        ),
        Err(StoreError::Conflict {
            items,
            scope_version,
            ..
        }) => (
            StatusCode::CONFLICT,
            ReorderResponse::Conflict {
                items,
                scope_version,
            },
        ),
        Err(StoreError::ScopeNotFound(id)) => {
            (StatusCode::NOT_FOUND, ReorderResponse::NotFound { id })
        }
        Err(StoreError::ItemNotFound(id)) => (
            StatusCode::NOT_FOUND,
            ReorderResponse::NotFound { id: id.to_string() },
        ),
        Err(StoreError::Malformed(reason)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ReorderResponse::Invalid { reason },
        ),
    }
}

async fn get_scope(
    State(store): State<Arc<ListStore>>,
    Path(scope): Path<String>,
) -> (StatusCode, Json<ReorderResponse>) {
    let (status, body) = respond(store.snapshot(&scope).await);
    (status, Json(body))
}

async fn create_item(
    State(store): State<Arc<ListStore>>,
    Path(scope): Path<String>,
    Json(request): Json<CreateItemRequest>,
) -> (StatusCode, Json<ReorderResponse>) {
    let (status, body) = respond(
        store
            .create_item(&scope, request.id, request.repositioned_after_id)
            .await,
    );
    (status, Json(body))
}

async fn reorder(
    State(store): State<Arc<ListStore>>,
    Path(scope): Path<String>,
    Json(request): Json<RepositionRequest>,
) -> (StatusCode, Json<ReorderResponse>) {
    let (status, body) = respond(store.reposition(&scope, &request).await);
    (status, Json(body))
}

async fn reorder_batch(
    State(store): State<Arc<ListStore>>,
    Path(scope): Path<String>,
    Json(request): Json<BatchReorderRequest>,
) -> (StatusCode, Json<ReorderResponse>) {
    let (status, body) = respond(store.apply_batch(&scope, &request).await);
    (status, Json(body))
}

async fn rebalance(
    State(store): State<Arc<ListStore>>,
    Path(scope): Path<String>,
    Json(request): Json<RebalanceRequest>,
) -> (StatusCode, Json<ReorderResponse>) {
    let (status, body) = respond(store.rebalance(&scope, request.scope_version).await);
    (status, Json(body))
}

/// Binds the listener and serves the API on a background task.
///
/// Binding port 0 picks an ephemeral port; the bound address is returned
/// alongside the join handle so tests and callers can reach the server.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound.
pub async fn start_server(
    addr: &str,
    store: Arc<ListStore>,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let app = router(store);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "reorder server terminated");
        }
    });
    Ok((local_addr, handle))
}
