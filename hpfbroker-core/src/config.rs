//! Configuration management
//!
//! A single TOML file, optionally overridden by `HPFBROKER_*` environment
//! variables. The loaded [`BrokerConfig`] is immutable for the life of the
//! process.

use crate::config_error;
use crate::credentials::CredentialPolicy;
use crate::error::{BrokerError, BrokerResult, ErrorContext};
use crate::logging::LoggingConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for `http.token_ttl_secs`, roughly a century
pub const MAX_TOKEN_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "hpfbroker.db".to_string(),
        }
    }
}

/// Settings handed to the hpfeeds broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub name: String,
    pub port: u16,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            name: "hpfbroker".to_string(),
            port: 10000,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub addr: String,
    /// Base64 encoded token signing key
    pub signing_secret: String,
    /// Token lifetime; tokens never expire when unset
    pub token_ttl_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            signing_secret: String::new(),
            token_ttl_secs: None,
        }
    }
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("addr", &self.addr)
            .field("signing_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

/// First administrator, created at start-up when absent
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_name: Option<String>,
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_name", &self.admin_name)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub database: DatabaseConfig,
    pub hpfeeds: FeedConfig,
    pub http: HttpConfig,
    pub policy: CredentialPolicy,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
}

impl BrokerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> BrokerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BrokerError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_metadata("path", &path.display().to_string()),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> BrokerResult<Self> {
        toml::from_str(content).map_err(|e| BrokerError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("parse_toml"),
        })
    }

    /// Apply `HPFBROKER_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> BrokerResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> BrokerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("HPFBROKER_DB_PATH") {
            self.database.path = path;
        }
        if let Some(name) = lookup("HPFBROKER_FEED_NAME") {
            self.hpfeeds.name = name;
        }
        if let Some(port) = lookup("HPFBROKER_FEED_PORT") {
            self.hpfeeds.port = port
                .parse()
                .map_err(|e| config_error!(format!("Invalid HPFBROKER_FEED_PORT: {}", e), e))?;
        }
        if let Some(addr) = lookup("HPFBROKER_HTTP_ADDR") {
            self.http.addr = addr;
        }
        if let Some(secret) = lookup("HPFBROKER_SIGNING_SECRET") {
            self.http.signing_secret = secret;
        }
        if let Some(ttl) = lookup("HPFBROKER_TOKEN_TTL_SECS") {
            let ttl: u64 = ttl
                .parse()
                .map_err(|e| config_error!(format!("Invalid HPFBROKER_TOKEN_TTL_SECS: {}", e), e))?;
            self.http.token_ttl_secs = Some(ttl);
        }
        if let Some(password) = lookup("HPFBROKER_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(password);
        }
        if let Some(level) = lookup("HPFBROKER_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Decoded token signing key
    pub fn signing_secret_bytes(&self) -> BrokerResult<Vec<u8>> {
        let secret = STANDARD
            .decode(self.http.signing_secret.trim())
            .map_err(|e| config_error!(format!("signing_secret is not valid base64: {}", e), e))?;

        if secret.is_empty() {
            return Err(config_error!("signing_secret must not be empty"));
        }
        Ok(secret)
    }

    /// Validate the configuration
    pub fn validate(&self) -> BrokerResult<()> {
        if self.database.path.trim().is_empty() {
            return Err(config_error!("database.path must not be empty"));
        }

        if self.hpfeeds.port == 0 {
            return Err(config_error!("hpfeeds.port must be greater than 0"));
        }

        if self.http.addr.trim().is_empty() {
            return Err(config_error!("http.addr must not be empty"));
        }

        if let Some(ttl) = self.http.token_ttl_secs {
            if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
                return Err(config_error!(format!(
                    "http.token_ttl_secs must be between 1 and {}",
                    MAX_TOKEN_TTL_SECS
                )));
            }
        }

        if self.policy.max_username_length == 0 {
            return Err(config_error!("policy.max_username_length must be greater than 0"));
        }

        if let Some(name) = &self.bootstrap.admin_name {
            if self.bootstrap.admin_password.is_none() {
                return Err(config_error!(format!(
                    "bootstrap.admin_password (or HPFBROKER_ADMIN_PASSWORD) is required to create {}",
                    name
                )));
            }
        }

        self.signing_secret_bytes()?;
        Ok(())
    }
}
