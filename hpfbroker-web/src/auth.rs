//! Authentication and authorization
//!
//! Callers trade Basic credentials for a signed role token at
//! `/api/authenticate`, then present it as a bearer token to the resource
//! routes, where a [`PermissionGate`] checks the role against the RBAC graph.

pub mod basic;
pub mod gate;
pub mod token;

pub use basic::{authenticate, AuthError, BasicCredentials};
pub use gate::{require_permission, PermissionGate};
pub use token::{Claims, TokenError, TokenService};
