//! Shared application state

use crate::{auth::TokenService, WebError, WebResult};
use hpfbroker_core::{
    roles, Argon2Hasher, BrokerConfig, BrokerError, BrokerResult, CredentialHasher,
    CredentialPolicy, ErrorContext, Rbac, ResourceStore, User,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Everything a handler may need, cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BrokerConfig>,
    pub store: ResourceStore,
    pub tokens: Arc<TokenService>,
    pub rbac: Arc<Rbac>,
    pub hasher: Arc<dyn CredentialHasher>,
}

impl AppState {
    /// Open the configured SQLite store and build the services around it
    pub async fn new(config: BrokerConfig) -> WebResult<Self> {
        let store = ResourceStore::sqlite(&config.database.path).await?;
        Self::with_store(config, store, Arc::new(Argon2Hasher::new()))
    }

    pub fn with_store(
        config: BrokerConfig,
        store: ResourceStore,
        hasher: Arc<dyn CredentialHasher>,
    ) -> WebResult<Self> {
        let secret = config.signing_secret_bytes()?;
        let ttl = config.http.token_ttl_secs.map(Duration::from_secs);

        Ok(Self {
            tokens: Arc::new(TokenService::new(&secret, ttl)),
            rbac: Arc::new(Rbac::standard()),
            config: Arc::new(config),
            store,
            hasher,
        })
    }

    pub fn policy(&self) -> &CredentialPolicy {
        &self.config.policy
    }

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, password: &str) -> BrokerResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| join_error(e, "hash"))?
    }

    /// Compare a password with a stored digest on the blocking pool
    pub async fn verify_password(&self, password: &str, digest: &str) -> BrokerResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let (password, digest) = (password.to_string(), digest.to_string());
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| join_error(e, "verify"))?
    }

    /// Create the configured first administrator unless a user of that name
    /// already exists. Returns whether a user was created.
    pub async fn bootstrap_admin(&self) -> WebResult<bool> {
        let bootstrap = &self.config.bootstrap;
        let (Some(name), Some(password)) = (&bootstrap.admin_name, &bootstrap.admin_password)
        else {
            return Ok(false);
        };

        if self.store.exists::<User>(name).await? {
            info!(user = %name, "Bootstrap administrator already present");
            return Ok(false);
        }

        let policy = self.policy();
        if let Err(violation) = policy
            .check_username(name)
            .and_then(|_| policy.check_password(password))
        {
            warn!(user = %name, "Refusing to create bootstrap administrator");
            return Err(WebError::Config(format!("bootstrap administrator: {}", violation)));
        }

        let user = User {
            name: name.clone(),
            hash: self.hash_password(password).await?,
            role: roles::SUPER_ADMIN.to_string(),
        };
        self.store.put(&user).await?;

        info!(user = %name, role = %user.role, "Created bootstrap administrator");
        Ok(true)
    }
}

fn join_error(err: tokio::task::JoinError, operation: &str) -> BrokerError {
    BrokerError::Hashing {
        message: err.to_string(),
        context: ErrorContext::new("credentials").with_operation(operation),
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hpfbroker_core::BootstrapConfig;

    /// Memory-backed state with a cheap hasher
    pub(crate) fn test_state(bootstrap: BootstrapConfig) -> AppState {
        let mut config = BrokerConfig::default();
        config.bootstrap = bootstrap;
        test_state_with(config, ResourceStore::memory())
    }

    /// State over an arbitrary store; the signing secret is filled in
    pub(crate) fn test_state_with(mut config: BrokerConfig, store: ResourceStore) -> AppState {
        config.http.signing_secret = "dGVzdC1zaWduaW5nLXNlY3JldA==".to_string();

        let hasher = Argon2Hasher::with_params(1024, 1, 1).unwrap();
        AppState::with_store(config, store, Arc::new(hasher)).unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_admin_once() {
        let state = test_state(BootstrapConfig {
            admin_name: Some("root".to_string()),
            admin_password: Some("correct horse".to_string()),
        });

        assert!(state.bootstrap_admin().await.unwrap());
        assert!(!state.bootstrap_admin().await.unwrap());

        let user = state.store.get::<User>("root").await.unwrap().unwrap();
        assert_eq!(user.role, roles::SUPER_ADMIN);
        assert!(state.hasher.verify("correct horse", &user.hash).unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_respects_policy() {
        let state = test_state(BootstrapConfig {
            admin_name: Some("root".to_string()),
            admin_password: Some("short".to_string()),
        });

        assert!(state.bootstrap_admin().await.is_err());
        assert!(!state.store.exists::<User>("root").await.unwrap());
    }

    #[tokio::test]
    async fn test_password_helpers_run_off_the_runtime() {
        let state = test_state(BootstrapConfig::default());

        let digest = state.hash_password("Str0ngPass!").await.unwrap();
        assert!(state.verify_password("Str0ngPass!", &digest).await.unwrap());
        assert!(!state.verify_password("wrong-pass", &digest).await.unwrap());

        let err = state.verify_password("anything", "garbage").await.unwrap_err();
        assert!(matches!(err, BrokerError::Hashing { .. }));
    }

    #[tokio::test]
    async fn test_no_bootstrap_section() {
        let state = test_state(BootstrapConfig::default());
        assert!(!state.bootstrap_admin().await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_secret_is_rejected() {
        let config = BrokerConfig::default();
        let result = AppState::with_store(
            config,
            ResourceStore::memory(),
            Arc::new(Argon2Hasher::new()),
        );
        assert!(result.is_err());
    }
}
