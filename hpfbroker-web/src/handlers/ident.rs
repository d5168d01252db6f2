//! `/api/ident/` handlers

use super::decode_body;
use crate::error::{ApiError, MISMATCHED_IDENTIFIER, MISSING_IDENTIFIER};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hpfbroker_core::Identity;
use tracing::info;

pub const NOT_FOUND: &str = "Identity not found";

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Identity>>, ApiError> {
    Ok(Json(state.store.list::<Identity>().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Identity>, ApiError> {
    state
        .store
        .get::<Identity>(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}

/// `PUT /api/ident/` has nothing to address
pub async fn put_collection() -> ApiError {
    ApiError::bad_request(MISSING_IDENTIFIER)
}

pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Identity>), ApiError> {
    let identity: Identity = decode_body(&body)?;
    if identity.ident != id {
        return Err(ApiError::bad_request(MISMATCHED_IDENTIFIER));
    }

    let existed = state.store.exists::<Identity>(&id).await?;
    state.store.put(&identity).await?;

    info!(ident = %id, created = !existed, "Saved identity");
    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(identity)))
}

pub async fn delete_all(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.delete_all::<Identity>().await?;
    info!("Deleted all identities");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.store.exists::<Identity>(&id).await? {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    state.store.delete::<Identity>(&id).await?;
    info!(ident = %id, "Deleted identity");
    Ok(StatusCode::NO_CONTENT)
}
