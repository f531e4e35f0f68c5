// ============================
// crates/auth/src/storage.rs
// ============================
//! Persistence seams with in-memory and flat-file implementations.
//!
//! The embedding application normally supplies its own ORM-backed
//! stores; [`MemoryStorage`] backs tests and the demo binary, and
//! [`FlatFileStorage`] is a small JSON-on-disk backend for
//! single-process deployments.

use std::{fs, path::{Path, PathBuf}, sync::Arc};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use gatehouse_common::{Identity, RememberToken};
use metrics::counter;
use rand::Rng;
use tokio::fs as tokio_fs;
use tracing::debug;

use crate::error::AuthError;
use crate::token::generate_token;

/// Identity lookup and persistence.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<Identity>, AuthError>;

    async fn save(&self, identity: &Identity) -> Result<(), AuthError>;
}

/// Lifecycle of remember-me tokens.
///
/// Creation is append-only and an identity may hold any number of live
/// tokens at once (multi-device remember-me). Lookup does not check
/// expiry; the `expires` field compared against the wall clock is the
/// sole source of truth, and stale rows may linger between GC passes.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &RememberToken) -> Result<(), AuthError>;

    /// Exact-match lookup by token string.
    async fn find(&self, token: &str) -> Result<Option<RememberToken>, AuthError>;

    async fn delete(&self, token: &str) -> Result<(), AuthError>;

    /// Revoke every token for an identity ("log out everywhere").
    async fn delete_all_for(&self, user_id: u64) -> Result<(), AuthError>;

    /// Bulk-delete all tokens whose expiry has passed. Idempotent.
    async fn delete_expired(&self) -> Result<(), AuthError>;

    /// Mint and persist a fresh token for `user_id`.
    ///
    /// With ~1% probability this also runs [`delete_expired`], which
    /// amortizes cleanup without a background scheduler.
    ///
    /// [`delete_expired`]: TokenStore::delete_expired
    async fn create(&self, user_id: u64, ttl: Duration) -> Result<RememberToken, AuthError> {
        if rand::thread_rng().gen_range(1..=100) == 1 {
            self.delete_expired().await?;
        }

        let token = RememberToken {
            user_id,
            token: generate_token(),
            expires: Utc::now() + ttl,
        };
        self.insert(&token).await?;
        counter!("auth.tokens.created").increment(1);
        Ok(token)
    }
}

/// In-memory implementation of both stores.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    identities: Arc<DashMap<u64, Identity>>,
    tokens: Arc<DashMap<String, RememberToken>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live tokens currently held by an identity.
    pub fn tokens_for(&self, user_id: u64) -> Vec<RememberToken> {
        self.tokens
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Total number of stored tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl IdentityStore for MemoryStorage {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .identities
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Identity>, AuthError> {
        Ok(self.identities.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, identity: &Identity) -> Result<(), AuthError> {
        self.identities.insert(identity.id, identity.clone());
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStorage {
    async fn insert(&self, token: &RememberToken) -> Result<(), AuthError> {
        self.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RememberToken>, AuthError> {
        Ok(self.tokens.get(token).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, token: &str) -> Result<(), AuthError> {
        self.tokens.remove(token);
        Ok(())
    }

    async fn delete_all_for(&self, user_id: u64) -> Result<(), AuthError> {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| token.user_id != user_id);
        counter!("auth.tokens.revoked").increment((before - self.tokens.len()) as u64);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<(), AuthError> {
        let now = Utc::now();
        let before = self.tokens.len();
        self.tokens.retain(|_, token| !token.is_expired(now));

        let removed = before - self.tokens.len();
        if removed > 0 {
            counter!("auth.tokens.expired").increment(removed as u64);
            debug!(removed, "expired remember-me tokens collected");
        }
        Ok(())
    }
}

/// Flat-file implementation of both stores.
///
/// Identities live under `identities/<id>.json`, tokens under
/// `tokens/<token>.json`; token strings are URL-safe base64, so they
/// are valid file names as-is.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, AuthError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("identities"))?;
        fs::create_dir_all(root.join("tokens"))?;
        Ok(Self { root })
    }

    fn identity_path(&self, id: u64) -> PathBuf {
        self.root.join("identities").join(format!("{id}.json"))
    }

    fn token_path(&self, token: &str) -> PathBuf {
        self.root.join("tokens").join(format!("{token}.json"))
    }

    async fn read_identity(&self, path: &Path) -> Result<Identity, AuthError> {
        let content = tokio_fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn each_token_path(&self) -> Result<Vec<PathBuf>, AuthError> {
        let mut paths = Vec::new();
        let mut dir = tokio_fs::read_dir(self.root.join("tokens")).await?;
        while let Some(entry) = dir.next_entry().await? {
            paths.push(entry.path());
        }
        Ok(paths)
    }
}

/// Token strings arrive from the transport boundary; anything outside
/// the URL-safe base64 alphabet cannot be one of ours and must never
/// reach the filesystem.
fn is_storable_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl IdentityStore for FlatFileStorage {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError> {
        let mut dir = tokio_fs::read_dir(self.root.join("identities")).await?;
        while let Some(entry) = dir.next_entry().await? {
            let identity = self.read_identity(&entry.path()).await?;
            if identity.username == username {
                return Ok(Some(identity));
            }
        }
        Ok(None)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Identity>, AuthError> {
        let path = self.identity_path(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_identity(&path).await?))
    }

    async fn save(&self, identity: &Identity) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(identity)?;
        tokio_fs::write(self.identity_path(identity.id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FlatFileStorage {
    async fn insert(&self, token: &RememberToken) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(token)?;
        tokio_fs::write(self.token_path(&token.token), json).await?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RememberToken>, AuthError> {
        if !is_storable_token(token) {
            return Ok(None);
        }
        let path = self.token_path(token);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn delete(&self, token: &str) -> Result<(), AuthError> {
        if !is_storable_token(token) {
            return Ok(());
        }
        match tokio_fs::remove_file(self.token_path(token)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_all_for(&self, user_id: u64) -> Result<(), AuthError> {
        for path in self.each_token_path().await? {
            let content = tokio_fs::read_to_string(&path).await?;
            let token: RememberToken = serde_json::from_str(&content)?;
            if token.user_id == user_id {
                tokio_fs::remove_file(&path).await?;
                counter!("auth.tokens.revoked").increment(1);
            }
        }
        Ok(())
    }

    async fn delete_expired(&self) -> Result<(), AuthError> {
        let now = Utc::now();
        for path in self.each_token_path().await? {
            let content = tokio_fs::read_to_string(&path).await?;
            let token: RememberToken = serde_json::from_str(&content)?;
            if token.is_expired(now) {
                tokio_fs::remove_file(&path).await?;
                counter!("auth.tokens.expired").increment(1);
            }
        }
        Ok(())
    }
}
