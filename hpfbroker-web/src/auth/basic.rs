//! Basic credentials to bearer token exchange

use super::TokenError;
use crate::AppState;
use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hpfbroker_core::{BrokerError, User};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The header is not `Basic <base64 name:password>`
    #[error("Failed to authenticate")]
    MalformedHeader,
    #[error("Failed to authenticate")]
    UnknownUser,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] BrokerError),
    #[error(transparent)]
    Signing(#[from] TokenError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MalformedHeader => StatusCode::BAD_REQUEST,
            AuthError::UnknownUser | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) | AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(err) = &self {
            err.log();
        }

        let status = self.status();
        let body = self.to_string();
        if status == StatusCode::UNAUTHORIZED {
            (status, [(WWW_AUTHENTICATE, "Basic")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Name and password carried by an `Authorization: Basic` header
#[derive(PartialEq, Eq)]
pub struct BasicCredentials {
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    /// Parse the `Authorization` header. The payload splits at the first
    /// colon, so passwords may contain colons but names may not.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let header = headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
            .transpose()?
            .unwrap_or_default();

        let encoded = match header.split_once(' ') {
            Some(("Basic", encoded)) => encoded,
            _ => return Err(AuthError::MalformedHeader),
        };

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| AuthError::MalformedHeader)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;

        let (name, password) = decoded
            .split_once(':')
            .ok_or(AuthError::MalformedHeader)?;

        Ok(Self {
            name: name.to_string(),
            password: password.to_string(),
        })
    }
}

/// `POST /api/authenticate`: answers with the raw token text
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<String, AuthError> {
    let credentials = BasicCredentials::from_headers(&headers)?;

    let Some(user) = state.store.get::<User>(&credentials.name).await? else {
        debug!(user = %credentials.name, "Authentication for unknown user");
        return Err(AuthError::UnknownUser);
    };

    if !state.verify_password(&credentials.password, &user.hash).await? {
        warn!(user = %user.name, "Invalid credentials");
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.tokens.sign(&user.role)?;
    info!(user = %user.name, role = %user.role, "Issued token");

    Ok(token)
}
