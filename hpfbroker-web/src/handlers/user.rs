//! `/api/user/` handlers
//!
//! Responses only ever carry [`UserView`]; password digests stay in the store.

use super::decode_body;
use crate::error::{ApiError, INVALID_ROLE, MISMATCHED_IDENTIFIER, MISSING_IDENTIFIER};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hpfbroker_core::{User, UserRequest, UserView};
use tracing::info;

pub const NOT_FOUND: &str = "User not found";

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.store.list::<User>().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    state
        .store
        .get::<User>(&id)
        .await?
        .map(|user| Json(user.view()))
        .ok_or(ApiError::NotFound(NOT_FOUND))
}

/// `PUT /api/user/` has nothing to address
pub async fn put_collection() -> ApiError {
    ApiError::bad_request(MISSING_IDENTIFIER)
}

pub async fn put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let request: UserRequest = decode_body(&body)?;
    if request.name != id {
        return Err(ApiError::bad_request(MISMATCHED_IDENTIFIER));
    }

    let policy = state.policy();
    policy.check_username(&request.name)?;
    policy.check_password(&request.password)?;
    if !state.rbac.has_role(&request.role) {
        return Err(ApiError::bad_request(INVALID_ROLE));
    }

    let user = User {
        hash: state.hash_password(&request.password).await?,
        name: request.name,
        role: request.role,
    };

    let existed = state.store.exists::<User>(&id).await?;
    state.store.put(&user).await?;

    info!(user = %user.name, role = %user.role, created = !existed, "Saved user");
    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(user.view())))
}

pub async fn delete_all(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.delete_all::<User>().await?;
    info!("Deleted all users");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.store.exists::<User>(&id).await? {
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    state.store.delete::<User>(&id).await?;
    info!(user = %id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}
