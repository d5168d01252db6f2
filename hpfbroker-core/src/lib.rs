//! HPFBroker core - domain types, RBAC engine and resource store
//!
//! Everything here is independent of HTTP; the management API in
//! `hpfbroker-web` and the hpfeeds broker both build on it.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod rbac;
pub mod store;
pub mod types;

pub use config::*;
pub use credentials::*;
pub use error::*;
pub use logging::*;
pub use rbac::{roles, Permission, Rbac, RbacBuilder};
pub use store::{Bucket, IdentityLookup, KvStore, MemoryStore, Resource, ResourceStore, SqliteStore};
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
