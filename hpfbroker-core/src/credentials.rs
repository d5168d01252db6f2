//! Password hashing and credential policy

use crate::error::{BrokerError, BrokerResult, ErrorContext};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

/// Hash/verify capability used for user passwords
pub trait CredentialHasher: Send + Sync + std::fmt::Debug {
    /// Produce an encoded digest for `password`
    fn hash(&self, password: &str) -> BrokerResult<String>;

    /// Compare `password` with a digest produced by [`CredentialHasher::hash`].
    /// A digest that cannot be parsed is an error, a mismatch is `Ok(false)`.
    fn verify(&self, password: &str, digest: &str) -> BrokerResult<bool>;
}

/// Argon2id hasher producing PHC-encoded digests
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Use explicit cost parameters (memory in KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> BrokerResult<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|e| hashing_error(e, "params"))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> BrokerResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| hashing_error(e, "hash"))
    }

    fn verify(&self, password: &str, digest: &str) -> BrokerResult<bool> {
        let parsed_hash = PasswordHash::new(digest).map_err(|e| hashing_error(e, "parse_digest"))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(hashing_error(e, "verify")),
        }
    }
}

fn hashing_error(err: impl std::fmt::Display, operation: &str) -> BrokerError {
    BrokerError::Hashing {
        message: err.to_string(),
        context: ErrorContext::new("credentials").with_operation(operation),
    }
}

/// Rules applied to usernames and passwords before a user is stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialPolicy {
    /// Minimum password length in characters
    pub min_password_length: usize,
    /// Maximum username length in characters
    pub max_username_length: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            max_username_length: 64,
        }
    }
}

/// Why a credential was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Invalid username")]
    Username,
    #[error("Invalid password")]
    Password,
}

impl CredentialPolicy {
    /// Usernames travel inside Basic credentials, which split at the first
    /// colon, so a colon can never be part of a name.
    pub fn check_username(&self, name: &str) -> Result<(), PolicyViolation> {
        if name.is_empty()
            || name.contains(':')
            || name.chars().any(char::is_control)
            || name.chars().count() > self.max_username_length
        {
            return Err(PolicyViolation::Username);
        }
        Ok(())
    }

    pub fn check_password(&self, password: &str) -> Result<(), PolicyViolation> {
        if password.chars().count() < self.min_password_length {
            return Err(PolicyViolation::Password);
        }
        Ok(())
    }
}
