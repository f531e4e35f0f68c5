// ============================
// crates/auth/src/lib.rs
// ============================
//! Core authentication and authorization library for Gatehouse.
//!
//! The crate covers interactive login with hashed passwords, persistent
//! ("remember me") login via rotating single-use tokens, role-based
//! access checks over a compact bitmask, and session-bound caching of
//! the authenticated identity. The embedding application owns the HTTP
//! layer, routing and real persistence; this crate talks to them
//! through the [`IdentityStore`], [`TokenStore`], [`SessionStore`] and
//! [`TokenTransport`] seams.

pub mod config;
pub mod error;
pub mod password;
pub mod roles;
pub mod service;
pub mod session;
pub mod storage;
pub mod token;
pub mod transport;

pub use gatehouse_common::{Identity, RememberToken, VerifyCode};

pub use config::Settings;
pub use error::AuthError;
pub use password::{PasswordHasher, PasswordPolicy};
pub use roles::{RoleRegistry, RoleSet};
pub use service::Auth;
pub use session::{MemorySession, SessionCache, SessionStore};
pub use storage::{FlatFileStorage, IdentityStore, MemoryStorage, TokenStore};
pub use transport::{MemoryTransport, TokenTransport};
