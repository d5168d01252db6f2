//! Shared setup for end-to-end tests: a real server on an ephemeral port
//! backed by a SQLite file in a temporary directory.

#![allow(dead_code)]

use hpfbroker_core::{Argon2Hasher, BootstrapConfig, BrokerConfig, ResourceStore};
use hpfbroker_web::{AppState, BrokerServer};
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;

pub const ADMIN_NAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

// Ensure tracing is only initialised once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub api_client: reqwest::Client,
    _data_dir: tempfile::TempDir,
}

impl TestApp {
    /// Exchange Basic credentials for a token
    pub async fn authenticate(&self, name: &str, password: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/authenticate", &self.address))
            .basic_auth(name, Some(password))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Authenticate and return the token, panicking on failure
    pub async fn token_for(&self, name: &str, password: &str) -> String {
        let response = self.authenticate(name, password).await;
        assert_eq!(response.status().as_u16(), 200, "login failed for {}", name);
        response.text().await.expect("Failed to read token")
    }

    pub async fn admin_token(&self) -> String {
        self.token_for(ADMIN_NAME, ADMIN_PASSWORD).await
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.api_client
            .get(format!("{}{}", &self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put<Body>(&self, path: &str, token: &str, body: &Body) -> reqwest::Response
    where
        Body: Serialize,
    {
        self.api_client
            .put(format!("{}{}", &self.address, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.api_client
            .delete(format!("{}{}", &self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Start a server seeded with the bootstrap administrator
pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = data_dir.path().join("broker.db");

    let mut config = BrokerConfig::default();
    config.database.path = db_path.to_string_lossy().into_owned();
    config.http.addr = "127.0.0.1:0".to_string();
    config.http.signing_secret = "ZTJlLXNpZ25pbmctc2VjcmV0".to_string();
    config.bootstrap = BootstrapConfig {
        admin_name: Some(ADMIN_NAME.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };
    config.validate().expect("Invalid test config");

    let store = ResourceStore::sqlite(&config.database.path)
        .await
        .expect("Failed to open store");
    // cheap parameters keep the suite fast
    let hasher = Argon2Hasher::with_params(1024, 1, 1).expect("Invalid hasher params");
    let state = AppState::with_store(config, store, Arc::new(hasher)).expect("Failed to build state");
    state.bootstrap_admin().await.expect("Failed to seed admin");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = BrokerServer::with_state(state.clone());
    tokio::spawn(server.serve(listener, std::future::pending()));

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        state,
        api_client: reqwest::Client::new(),
        _data_dir: data_dir,
    }
}
