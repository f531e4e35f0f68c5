// ================
// common/src/lib.rs
// ================
//! Shared data types for the Gatehouse authentication core.
//! These are plain records; all lifecycle logic lives in `gatehouse-auth`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated principal.
///
/// `password_hash` is always a PHC-format hash, never a plaintext
/// equivalent; plaintext passwords only pass through
/// `PasswordHasher::assign`, which hashes before storing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique id. Zero is never a usable id.
    pub id: u64,
    /// Lower-cased at login time; stored as registered.
    pub username: String,
    /// Self-describing adaptive hash (algorithm + cost embedded).
    pub password_hash: String,
    /// Role bitmask (see `gatehouse_auth::roles`).
    pub roles: u64,
    /// Eligibility flag (banned/disabled accounts carry `false`).
    pub active: bool,
    /// Outstanding verification code, if any.
    pub verify_code: Option<VerifyCode>,
    /// Stamped by the login-completion routine.
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(id: u64, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
            roles: 0,
            active: true,
            verify_code: None,
            last_login: None,
        }
    }

    /// Whether this identity may complete an interactive login.
    ///
    /// Inactive accounts and accounts with an outstanding verification
    /// code are ineligible.
    pub fn can_login(&self) -> bool {
        self.id != 0 && self.active && self.verify_code.is_none()
    }

    /// Last-login bookkeeping, run by the login-completion routine.
    pub fn complete_login(&mut self, now: DateTime<Utc>) {
        self.last_login = Some(now);
    }

    /// Redeem an outstanding verification code. Clears the code and
    /// returns `true` on a match that has not yet expired.
    pub fn redeem_verify_code(&mut self, code: &str, now: DateTime<Utc>) -> bool {
        match &self.verify_code {
            Some(vc) if vc.matches(code, now) => {
                self.verify_code = None;
                true
            },
            _ => false,
        }
    }
}

/// Expiring one-time verification code attached to an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCode {
    pub code: String,
    pub expires: DateTime<Utc>,
}

impl VerifyCode {
    pub fn new(code: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self { code: code.into(), expires }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires < now
    }

    pub fn matches(&self, code: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.code == code
    }
}

/// Long-lived remember-me credential granting auto-login without a
/// password. Single-use: every successful auto-login deletes the
/// consumed token and issues a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RememberToken {
    /// Owning identity id.
    pub user_id: u64,
    /// Opaque random token string (URL-safe base64, no padding).
    pub token: String,
    /// Absolute expiry.
    pub expires: DateTime<Utc>,
}

impl RememberToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires < now
    }
}
