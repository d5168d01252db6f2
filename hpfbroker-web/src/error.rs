//! API error type and its HTTP mapping
//!
//! Every error leaves the server as a status code with a plain-text body.

use crate::auth::{AuthError, TokenError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hpfbroker_core::{BrokerError, PolicyViolation};

pub const MISSING_IDENTIFIER: &str = "Missing identifier in URI";
pub const MISMATCHED_IDENTIFIER: &str = "URI doesn't match provided data";
pub const BODY_REQUIRED: &str = "Body is required for this endpoint";
pub const INVALID_ROLE: &str = "Invalid role";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Internal(#[from] BrokerError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Token(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Auth(err) => err.status(),
            ApiError::Internal(BrokerError::Validation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PolicyViolation> for ApiError {
    fn from(violation: PolicyViolation) -> Self {
        ApiError::BadRequest(violation.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Auth(err) => err.into_response(),
            ApiError::Internal(err) => {
                err.log();
                (status, err.to_string()).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}
