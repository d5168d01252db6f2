//! HPFBroker management API
//!
//! HTTP front end for managing hpfeeds identities and the administrative
//! users allowed to manage them.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use error::ApiError;
pub use server::BrokerServer;
pub use state::AppState;

use axum::{routing::get, Router};
use hpfbroker_core::BrokerError;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/status", get(handlers::status::status))
        .nest("/api", routes::api_routes(&state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] BrokerError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
