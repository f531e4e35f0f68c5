// ============================
// crates/auth/src/error.rs
// ============================
//! Central error type for the authentication core.
//!
//! Authentication *failures* (bad credentials, missing/unknown tokens,
//! corrupted session payloads) are reported as boolean or `Option`
//! results and recovered locally; only store/IO/configuration trouble
//! travels through `AuthError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid remember-me token")]
    TokenInvalid,

    #[error("corrupted session payload")]
    CorruptedSession,
}

impl AuthError {
    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Store(_) => "STORE_001",
            AuthError::Config(_) => "CFG_001",
            AuthError::Internal(_) => "INT_001",
            AuthError::Io(_) => "IO_001",
            AuthError::Json(_) => "JSON_001",
            AuthError::TokenInvalid => "TOKEN_001",
            AuthError::CorruptedSession => "SESSION_001",
        }
    }

    /// Get a sanitized message suitable for surfacing to end users
    pub fn sanitized_message(&self) -> String {
        match self {
            AuthError::TokenInvalid | AuthError::CorruptedSession => {
                "Authentication failed".to_string()
            },
            AuthError::Json(_) => "Invalid data format".to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }
}

impl From<String> for AuthError {
    fn from(msg: String) -> Self {
        AuthError::Internal(msg)
    }
}

impl From<&str> for AuthError {
    fn from(msg: &str) -> Self {
        AuthError::Internal(msg.to_string())
    }
}
