// ============================
// crates/auth/src/config.rs
// ============================
//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::password::{PasswordPolicy, DEFAULT_COST};

/// Thirty days, the default remember-me lifetime.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 60 * 60 * 24 * 30;

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Session slot holding the serialized identity
    pub session_key: String,
    /// Session slot marking a forced (administrative) login
    pub forced_key: String,
    /// Remember-me token lifetime in seconds
    pub token_lifetime_secs: u64,
    /// Password hashing work factor (scrypt `log2(N)`)
    pub hash_cost: u8,
    /// Password complexity requirements
    pub password_policy: PasswordPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_key: "auth_user".to_string(),
            forced_key: "auth_forced".to_string(),
            token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            hash_cost: DEFAULT_COST,
            password_policy: PasswordPolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from `gatehouse.toml` and `GATEHOUSE_`-prefixed
    /// environment variables, over serialized defaults.
    pub fn load() -> Result<Self, AuthError> {
        Self::load_from("gatehouse.toml")
    }

    /// Load settings with an explicit config file path.
    pub fn load_from(path: &str) -> Result<Self, AuthError> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("GATEHOUSE_"))
            .extract()
            .map_err(|e| AuthError::Config(e.to_string()))
    }
}
