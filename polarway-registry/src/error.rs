//! Error types for polarway-registry — Railway Programming
//!
//! All operations return `Result<T, RegistryError>`.
//! Domain failures (bad input, conflicts, unknown ids, auth) are kept apart
//! from server failures so callers can tell "your request was bad" from
//! "the service is broken".

use thiserror::Error;

/// Unified error type for all registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    // ─── Request Errors ───

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    // ─── Auth Errors ───

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Access token required")]
    MissingToken,

    #[error("Invalid or expired token")]
    Unauthenticated,

    #[error("Token expired")]
    TokenExpired,

    // ─── Infrastructure Errors ───

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store failure on collection {collection}: {reason}")]
    StoreFailure { collection: String, reason: String },

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Actor unavailable: {0}")]
    ActorUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Failures the client cannot correct; reported opaquely
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Serialization(_)
                | Self::StoreFailure { .. }
                | Self::Hashing(_)
                | Self::Config(_)
                | Self::ActorUnavailable(_)
                | Self::Internal(_)
        )
    }

    /// Message safe to hand back to a client
    pub fn public_message(&self) -> String {
        match self {
            Self::TokenExpired => "Invalid or expired token".to_string(),
            e if e.is_server_error() => "Internal server error".to_string(),
            e => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Serialization(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for RegistryError {
    fn from(err: argon2::password_hash::Error) -> Self {
        RegistryError::Hashing(err.to_string())
    }
}

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
