// ============================
// crates/auth/src/password.rs
// ============================
//! Password hashing and verification.

use gatehouse_common::Identity;
use scrypt::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::AuthError;

/// Default work factor (scrypt `log2(N)`).
pub const DEFAULT_COST: u8 = 8;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 10;

/// Adaptive one-way password hashing with a configurable work factor.
///
/// The produced hash is a self-describing PHC string (algorithm, cost
/// and salt embedded), so verification never needs the original cost
/// parameter. Stateless; safe to call concurrently.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u8,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u8) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password.
    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(self.cost, 8, 1, Params::RECOMMENDED_LEN)
            .map_err(|e| AuthError::Internal(format!("bad scrypt params: {e}")))?;
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// Hash a plaintext password and zeroize the original buffer.
    pub fn hash_secure(&self, plain: &mut String) -> Result<String, AuthError> {
        let hash = self.hash(plain)?;
        plain.zeroize();
        Ok(hash)
    }

    /// Verify a plaintext password against a stored hash.
    ///
    /// Never fails on a malformed hash; that is simply not a match.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// Set an identity's password, hashing before it is stored. The
    /// plaintext buffer is zeroized; the identity never sees it.
    pub fn assign(&self, identity: &mut Identity, plain: &mut String) -> Result<(), AuthError> {
        identity.password_hash = self.hash_secure(plain)?;
        Ok(())
    }
}

/// Password complexity requirements, for signup/change-password flows.
/// Interactive login only verifies; it never re-checks the policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Check if a password meets the complexity requirements
    pub fn meets(&self, password: &str) -> bool {
        if password.len() < self.min_length {
            return false;
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return false;
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            return false;
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }

        if self.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
            return false;
        }

        true
    }
}
