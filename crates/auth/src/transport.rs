// ============================
// crates/auth/src/transport.rs
// ============================
//! The transport boundary carrying the remember-me credential.
//!
//! In production this is a long-lived HTTP cookie owned by the web
//! layer; the core only ever reads, replaces or clears the value.

use std::{sync::Arc, time::Duration};

use parking_lot::RwLock;

/// Cookie/header carrier for the remember-me token.
pub trait TokenTransport: Send + Sync {
    /// Token presented with the current request, if any.
    fn remember_token(&self) -> Option<String>;

    /// Hand a freshly minted token to the client for `ttl`.
    fn set_remember_token(&self, token: &str, ttl: Duration);

    /// Drop the client-side token.
    fn clear_remember_token(&self);
}

/// In-memory carrier for tests and the demo binary.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    token: Arc<RwLock<Option<String>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a token as if the client had presented it.
    pub fn present(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
    }
}

impl TokenTransport for MemoryTransport {
    fn remember_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_remember_token(&self, token: &str, _ttl: Duration) {
        *self.token.write() = Some(token.to_string());
    }

    fn clear_remember_token(&self) {
        *self.token.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport() {
        let transport = MemoryTransport::new();
        assert!(transport.remember_token().is_none());

        transport.set_remember_token("abc", Duration::from_secs(60));
        assert_eq!(transport.remember_token().as_deref(), Some("abc"));

        transport.clear_remember_token();
        assert!(transport.remember_token().is_none());
    }
}
