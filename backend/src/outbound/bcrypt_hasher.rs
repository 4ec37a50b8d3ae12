//! bcrypt implementation of the `PasswordHasher` port.
//!
//! Hashing is CPU bound, so both operations run on the blocking pool with
//! the caller's trace id carried across.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{PasswordHash, TraceId};

/// Cost used by existing account rows.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHasherError> {
        let cost = self.cost;
        let secret = Zeroizing::new(password.to_owned());
        TraceId::spawn_blocking(move || bcrypt::hash(secret.as_bytes(), cost))
            .await
            .map_err(|error| PasswordHasherError::hash(error.to_string()))?
            .map(PasswordHash::new)
            .map_err(|error| PasswordHasherError::hash(error.to_string()))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let secret = Zeroizing::new(password.to_owned());
        let encoded = hash.as_str().to_owned();
        TraceId::spawn_blocking(move || bcrypt::verify(secret.as_bytes(), &encoded))
            .await
            .map_err(|error| PasswordHasherError::hash(error.to_string()))?
            .map_err(|error| PasswordHasherError::hash(error.to_string()))
    }
}
