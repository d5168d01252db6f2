//! Per-route permission check
//!
//! Installed with `axum::middleware::from_fn_with_state`, one gate per
//! required permission. Decisions are made fresh for every request.

use super::TokenService;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hpfbroker_core::{Permission, Rbac};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PermissionGate {
    tokens: Arc<TokenService>,
    rbac: Arc<Rbac>,
    permission: Permission,
}

impl PermissionGate {
    pub fn new(tokens: Arc<TokenService>, rbac: Arc<Rbac>, permission: Permission) -> Self {
        Self {
            tokens,
            rbac,
            permission,
        }
    }

    pub fn from_state(state: &AppState, permission: Permission) -> Self {
        Self::new(state.tokens.clone(), state.rbac.clone(), permission)
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Resolve the caller's role from `Authorization: Bearer <token>` and
    /// check it holds the gate's permission
    pub fn authorize(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| match value.split_once(' ') {
                Some(("Bearer", token)) => Some(token),
                _ => None,
            })
            .ok_or(ApiError::Unauthorized)?;

        let role = self.tokens.verify(token)?;

        if !self.rbac.is_granted(&role, self.permission) {
            warn!(role = %role, permission = %self.permission, "Permission denied");
            return Err(ApiError::Forbidden);
        }

        Ok(role)
    }
}

pub async fn require_permission(
    State(gate): State<PermissionGate>,
    request: Request,
    next: Next,
) -> Response {
    match gate.authorize(request.headers()) {
        Ok(role) => {
            debug!(role = %role, permission = %gate.permission, "Permission granted");
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
