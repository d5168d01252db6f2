//! Liveness endpoint

/// `GET /status`, no authentication
pub async fn status() -> String {
    format!("hpfbroker {} online", env!("CARGO_PKG_VERSION"))
}
