// ============================
// crates/auth/src/session.rs
// ============================
//! Session-bound caching of the authenticated identity.
//!
//! The session store itself (cookie handling, id allocation, backend)
//! belongs to the embedding application; this module owns exactly one
//! slot inside it and knows how to recover when that slot is stale.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use gatehouse_common::Identity;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::error::AuthError;

/// External session store primitives consumed by the core.
///
/// `regenerate` rotates the session id while keeping its contents and
/// is required immediately after any privilege change; `destroy` drops
/// the whole session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, AuthError>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), AuthError>;

    async fn delete(&self, key: &str) -> Result<(), AuthError>;

    /// Rotate the session id, keeping the stored values.
    async fn regenerate(&self) -> Result<(), AuthError>;

    /// Drop the entire session.
    async fn destroy(&self) -> Result<(), AuthError>;

    /// Whether the transport presented a live session at all.
    async fn has_active_session(&self) -> bool;

    /// Current session id.
    async fn id(&self) -> String;
}

/// The identity slot inside the external session store.
///
/// This is how "logged in" survives across requests; there is no
/// process-wide singleton.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl SessionCache {
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Read the cached identity.
    ///
    /// A payload that no longer deserializes (e.g. the identity shape
    /// changed between deploys) is cleared and reported as "logged
    /// out", never as a request-fatal error.
    pub async fn get(&self) -> Result<Option<Identity>, AuthError> {
        let value = match self.store.get(&self.key).await? {
            Some(value) => value,
            None => return Ok(None),
        };

        match serde_json::from_value::<Identity>(value) {
            Ok(identity) => Ok(Some(identity)),
            Err(err) => {
                warn!(error = %err, code = AuthError::CorruptedSession.error_code(),
                    "corrupted session payload, clearing slot");
                self.store.delete(&self.key).await?;
                Ok(None)
            },
        }
    }

    /// Store the identity for the rest of the browser session.
    pub async fn set(&self, identity: &Identity) -> Result<(), AuthError> {
        let value = serde_json::to_value(identity)?;
        self.store.set(&self.key, value).await
    }

    /// Remove only the identity slot.
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.store.delete(&self.key).await
    }
}

/// In-memory session store for tests and the demo binary.
#[derive(Clone, Default)]
pub struct MemorySession {
    inner: Arc<RwLock<SessionInner>>,
}

struct SessionInner {
    id: String,
    values: HashMap<String, serde_json::Value>,
    active: bool,
}

impl Default for SessionInner {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            values: HashMap::new(),
            active: false,
        }
    }
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, AuthError> {
        Ok(self.inner.read().await.values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), AuthError> {
        let mut inner = self.inner.write().await;
        inner.values.insert(key.to_string(), value);
        inner.active = true;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.inner.write().await.values.remove(key);
        Ok(())
    }

    async fn regenerate(&self) -> Result<(), AuthError> {
        self.inner.write().await.id = Uuid::new_v4().to_string();
        Ok(())
    }

    async fn destroy(&self) -> Result<(), AuthError> {
        let mut inner = self.inner.write().await;
        inner.values.clear();
        inner.active = false;
        inner.id = Uuid::new_v4().to_string();
        Ok(())
    }

    async fn has_active_session(&self) -> bool {
        self.inner.read().await.active
    }

    async fn id(&self) -> String {
        self.inner.read().await.id.clone()
    }
}
