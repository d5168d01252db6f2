//! Route definitions for the management API

use crate::{
    auth::{authenticate, require_permission, PermissionGate},
    handlers::{ident, user},
    AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use hpfbroker_core::Permission;

/// Routes mounted under `/api`
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/authenticate", post(authenticate))
        .merge(ident_routes(state))
        .merge(user_routes(state))
}

fn gate(state: &AppState, permission: Permission) -> PermissionGate {
    PermissionGate::from_state(state, permission)
}

fn ident_routes(state: &AppState) -> Router<AppState> {
    let reads = Router::new()
        .route("/ident/", get(ident::list))
        .route("/ident/{id}", get(ident::get))
        .route_layer(from_fn_with_state(
            gate(state, Permission::HpfRead),
            require_permission,
        ));

    let writes = Router::new()
        .route("/ident/", put(ident::put_collection).delete(ident::delete_all))
        .route("/ident/{id}", put(ident::put).delete(ident::delete))
        .route_layer(from_fn_with_state(
            gate(state, Permission::HpfWrite),
            require_permission,
        ));

    reads.merge(writes)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let reads = Router::new()
        .route("/user/", get(user::list))
        .route("/user/{id}", get(user::get))
        .route_layer(from_fn_with_state(
            gate(state, Permission::UserRead),
            require_permission,
        ));

    let writes = Router::new()
        .route("/user/", put(user::put_collection).delete(user::delete_all))
        .route("/user/{id}", put(user::put).delete(user::delete))
        .route_layer(from_fn_with_state(
            gate(state, Permission::UserWrite),
            require_permission,
        ));

    reads.merge(writes)
}
