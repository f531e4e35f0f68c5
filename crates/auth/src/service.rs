// ============================
// crates/auth/src/service.rs
// ============================
//! The login/logout state machine.
//!
//! `Auth` is constructed once per request with handles to the external
//! collaborators; the only mutable state it holds is the identity
//! resolved for this request. All three entry points into the
//! authenticated state (`login`, `force_login`, `auto_login`) funnel
//! through `complete_login`, which rotates the session id before any
//! privilege is granted.

use std::sync::Arc;

use chrono::{Duration, Utc};
use gatehouse_common::Identity;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::AuthError;
use crate::password::PasswordHasher;
use crate::roles::RoleSet;
use crate::session::{SessionCache, SessionStore};
use crate::storage::{IdentityStore, TokenStore};
use crate::transport::TokenTransport;

/// Per-request authentication service.
pub struct Auth {
    identities: Arc<dyn IdentityStore>,
    tokens: Arc<dyn TokenStore>,
    session: SessionCache,
    transport: Arc<dyn TokenTransport>,
    hasher: PasswordHasher,
    settings: Arc<Settings>,
    /// Identity resolved for this request, if any.
    user: Option<Identity>,
}

impl Auth {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        tokens: Arc<dyn TokenStore>,
        session_store: Arc<dyn SessionStore>,
        transport: Arc<dyn TokenTransport>,
        settings: Arc<Settings>,
    ) -> Self {
        let session = SessionCache::new(session_store, settings.session_key.clone());
        let hasher = PasswordHasher::new(settings.hash_cost);
        Self {
            identities,
            tokens,
            session,
            transport,
            hasher,
            settings,
            user: None,
        }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// The currently logged-in identity, resolving in order: the
    /// per-request cache, the session slot, and (when `auto_login` is
    /// enabled) the remember-me token.
    pub async fn current_user(&mut self, auto_login: bool) -> Result<Option<Identity>, AuthError> {
        if self.user.is_some() {
            return Ok(self.user.clone());
        }

        if self.session.store().has_active_session().await {
            // A stale/corrupted payload is cleared inside the cache
            // and resolves to "logged out".
            self.user = self.session.get().await?;
        }

        // Check for a "remembered" login
        if auto_login && self.user.is_none() && self.transport.remember_token().is_some() {
            self.user = self.auto_login().await?;
        }

        // If somehow the cached identity was corrupted
        if matches!(&self.user, Some(user) if user.id == 0) {
            self.user = None;
            self.session.clear().await?;
        }

        Ok(self.user.clone())
    }

    /// Store an identity as the current user for this session.
    pub async fn set_user(&mut self, user: Identity) -> Result<(), AuthError> {
        self.session.set(&user).await?;
        self.user = Some(user);
        Ok(())
    }

    /// Attempt to log in with a username and plaintext password.
    ///
    /// Returns `true` only on a fully completed login; every failure
    /// path returns `false` without side effects.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<bool, AuthError> {
        if password.is_empty() {
            return Ok(false);
        }

        let username = username.to_lowercase();

        let user = match self.identities.find_by_username(&username).await? {
            Some(user) => user,
            None => return Ok(false),
        };

        if user.id != 0 && user.can_login() && self.hasher.verify(password, &user.password_hash) {
            if remember {
                self.set_autologin(user.id).await?;
            }

            // Finish the login
            self.complete_login(user).await?;

            return Ok(true);
        }

        // Login failed
        debug!(username = %username, "login rejected");
        Ok(false)
    }

    /// Log the user out and retire any remember-me credential.
    ///
    /// With `logout_all`, every token belonging to the identity is
    /// revoked ("log out everywhere"); otherwise only the one the
    /// client presented. Returns `true` iff the caller is no longer
    /// authenticated afterwards.
    pub async fn logout(
        &mut self,
        destroy_session: bool,
        logout_all: bool,
    ) -> Result<bool, AuthError> {
        // Set by force_login()
        self.session.store().delete(&self.settings.forced_key).await?;

        if let Some(token_str) = self.transport.remember_token() {
            // Drop the client-side token to prevent re-login
            self.transport.clear_remember_token();

            if let Some(token) = self.tokens.find(&token_str).await? {
                if logout_all {
                    self.tokens.delete_all_for(token.user_id).await?;
                } else {
                    self.tokens.delete(&token.token).await?;
                }
            }
        }

        if destroy_session {
            self.session.store().destroy().await?;
        } else {
            // Remove the identity slot and rotate the session id
            self.session.clear().await?;
            self.session.store().regenerate().await?;
        }

        self.user = None;

        // Double check
        Ok(!self.logged_in(None).await?)
    }

    /// Force a login without password verification (administrative /
    /// impersonation path; the caller is trusted).
    ///
    /// With `mark_forced` the session is flagged so downstream checks
    /// can restrict sensitive self-service actions.
    pub async fn force_login(&mut self, user: Identity, mark_forced: bool) -> Result<(), AuthError> {
        if mark_forced {
            self.session
                .store()
                .set(&self.settings.forced_key, serde_json::Value::Bool(true))
                .await?;
        }

        self.set_autologin(user.id).await?;

        // Run the standard completion
        self.complete_login(user).await
    }

    /// Whether the current session was entered via a marked forced login.
    pub async fn is_forced(&self) -> Result<bool, AuthError> {
        Ok(self
            .session
            .store()
            .get(&self.settings.forced_key)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false))
    }

    /// Log a user in based on the remember-me token.
    ///
    /// A valid token is single-use: the replacement is issued first,
    /// then the consumed token is deleted, so a crash in between
    /// leaves at worst an extra live token, never zero. An invalid,
    /// expired or orphaned token clears the client-side credential.
    pub async fn auto_login(&mut self) -> Result<Option<Identity>, AuthError> {
        let token_str = match self.transport.remember_token() {
            Some(token_str) => token_str,
            None => return Ok(None),
        };

        if let Some(token) = self.tokens.find(&token_str).await? {
            if !token.is_expired(Utc::now()) {
                if let Some(user) = self.identities.find_by_id(token.user_id).await? {
                    // Rotate: mint the replacement before retiring the
                    // consumed token
                    self.set_autologin(token.user_id).await?;

                    // Complete the login with the found identity
                    self.complete_login(user).await?;

                    self.tokens.delete(&token.token).await?;

                    // Automatic login was successful
                    return Ok(self.user.clone());
                }
            }
        }

        warn!(code = AuthError::TokenInvalid.error_code(), "remember-me token rejected");
        self.transport.clear_remember_token();
        Ok(None)
    }

    /// Re-verify a plaintext password for the currently logged-in user.
    pub async fn check_password(&mut self, password: &str) -> Result<bool, AuthError> {
        match self.current_user(true).await? {
            Some(user) => Ok(self.hasher.verify(password, &user.password_hash)),
            None => Ok(false),
        }
    }

    /// Whether a user is logged in, optionally holding a given role.
    pub async fn logged_in(&mut self, role: Option<u64>) -> Result<bool, AuthError> {
        match (self.current_user(true).await?, role) {
            (Some(user), Some(role)) => Ok(RoleSet::from(&user).has(role)),
            (Some(_), None) => Ok(true),
            (None, _) => Ok(false),
        }
    }

    /// The single choke point minting persistent tokens: create one
    /// with the configured lifetime and hand it to the transport.
    async fn set_autologin(&self, user_id: u64) -> Result<(), AuthError> {
        let ttl = Duration::seconds(self.settings.token_lifetime_secs as i64);
        let token = self.tokens.create(user_id, ttl).await?;

        self.transport.set_remember_token(
            &token.token,
            std::time::Duration::from_secs(self.settings.token_lifetime_secs),
        );
        Ok(())
    }

    /// The sole path into the authenticated state: rotate the session
    /// id against fixation, stamp last-login, persist, and cache the
    /// identity in the session.
    async fn complete_login(&mut self, mut user: Identity) -> Result<(), AuthError> {
        self.session.store().regenerate().await?;

        user.complete_login(Utc::now());
        self.identities.save(&user).await?;

        self.set_user(user).await
    }
}
