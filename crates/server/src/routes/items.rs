use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use models::{item::payload_object, Item, Patch};
use serde_json::Value;
use service::errors::ServiceError;
use tracing::info;

use crate::errors::ApiError;
use crate::state::AppState;

type JsonBody = Result<Json<Value>, JsonRejection>;

/// GET /items
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, ApiError> {
    state.store.list().await.map(Json).map_err(|e| state.error(e))
}

/// GET /items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    match state.store.get(&id).await {
        Ok(Some(item)) => Ok(Json(item)),
        Ok(None) => Err(ApiError::not_found()),
        Err(e) => Err(state.error(e)),
    }
}

/// POST /items — id and createdAt are always server-assigned.
pub async fn create_item(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(body) = body?;
    let payload = payload_object(body).map_err(|e| state.error(ServiceError::from(e)))?;
    let stored = state
        .store
        .put(Item::stamp(payload))
        .await
        .map_err(|e| state.error(e))?;
    info!(id = %stored.id, "item created");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PUT /items/:id — partial update; fields absent from the body are kept.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<Item>, ApiError> {
    let Json(body) = body?;
    let patch = Patch::from_value(body).map_err(|e| state.error(ServiceError::from(e)))?;
    let updated = state.store.update(&id, patch).await.map_err(|e| state.error(e))?;
    info!(%id, "item updated");
    Ok(Json(updated))
}

/// DELETE /items/:id — 204 whether or not the item existed.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await.map_err(|e| state.error(e))?;
    info!(%id, "item deleted");
    Ok(StatusCode::NO_CONTENT)
}
