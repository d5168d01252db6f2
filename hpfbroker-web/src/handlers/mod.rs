//! HTTP handlers
//!
//! Identities and users share one CRUD shape: collection and single-key
//! routes, idempotent `PUT`, and `DELETE` that empties a bucket or removes
//! one key.

pub mod ident;
pub mod status;
pub mod user;

use crate::error::{ApiError, BODY_REQUIRED};
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Decode a JSON request body; an empty body and bad JSON are both 400s
pub(crate) fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request(BODY_REQUIRED));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        create_app,
        state::tests::{test_state, test_state_with},
        AppState,
    };
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Method, Request, StatusCode},
        Router,
    };
    use hpfbroker_core::{
        roles, storage_error, BootstrapConfig, BrokerConfig, BrokerResult, Bucket, Identity,
        KvStore, ResourceStore,
    };
    use std::sync::Arc;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Router over a fresh memory store plus a token for `role`
    pub(crate) fn app_as(role: &str) -> (Router, AppState, String) {
        let state = test_state(BootstrapConfig::default());
        let token = state.tokens.sign(role).unwrap();
        (create_app(state.clone()), state, token)
    }

    pub(crate) async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<&str>,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Engine whose every operation fails
    struct BrokenEngine;

    #[hpfbroker_core::async_trait]
    impl KvStore for BrokenEngine {
        async fn get(&self, _: Bucket, _: &str) -> BrokerResult<Option<Vec<u8>>> {
            Err(storage_error!("database is locked", "get"))
        }

        async fn put(&self, _: Bucket, _: &str, _: Vec<u8>) -> BrokerResult<()> {
            Err(storage_error!("database is locked", "put"))
        }

        async fn delete(&self, _: Bucket, _: &str) -> BrokerResult<()> {
            Err(storage_error!("database is locked", "delete"))
        }

        async fn list(&self, _: Bucket) -> BrokerResult<Vec<Vec<u8>>> {
            Err(storage_error!("database is locked", "list"))
        }

        async fn clear(&self, _: Bucket) -> BrokerResult<()> {
            Err(storage_error!("database is locked", "clear"))
        }
    }

    #[tokio::test]
    async fn test_storage_failures_are_500() {
        let state = test_state_with(
            BrokerConfig::default(),
            ResourceStore::new(Arc::new(BrokenEngine)),
        );
        let token = state.tokens.sign(roles::SUPER_ADMIN).unwrap();
        let app = create_app(state);

        let requests = [
            (Method::GET, "/api/ident/x", None),
            (Method::GET, "/api/ident/", None),
            (Method::DELETE, "/api/ident/x", None),
            (
                Method::PUT,
                "/api/ident/x",
                Some(r#"{"ident":"x","secret":"s"}"#),
            ),
            (Method::GET, "/api/user/", None),
            (Method::DELETE, "/api/user/", None),
        ];

        for (method, uri, body) in requests {
            let (status, text) = send(&app, method.clone(), uri, &token, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
            assert_eq!(text, "Storage error: database is locked", "{} {}", method, uri);
        }
    }

    #[test]
    fn test_decode_body() {
        let err = decode_body::<Identity>(&Bytes::new()).unwrap_err();
        assert_eq!(err.to_string(), BODY_REQUIRED);

        let err = decode_body::<Identity>(&Bytes::from_static(b"{\"ident\":")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let identity: Identity =
            decode_body(&Bytes::from_static(br#"{"ident":"a","secret":"b"}"#)).unwrap();
        assert_eq!(identity.ident, "a");
    }
}
