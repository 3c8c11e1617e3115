//! Persisted document shapes for every registry collection
//!
//! Each collection is a single JSON document, replaced as a whole on save:
//! - `auth`  — credentials keyed by username, sessions keyed by token digest
//! - `users` — ordered array of user records

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{Role, SessionView};

// ─── Collection Names (constants) ───

pub const COLLECTION_AUTH: &str = "auth";
pub const COLLECTION_USERS: &str = "users";

// ─── Auth Collection ───

/// Credential as stored on disk. The secret is an Argon2id PHC string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Session as stored on disk, keyed by the SHA-256 digest of its token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub user: SessionView,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    /// `expires_at` is an exclusive upper bound
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The `auth` collection document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthDocument {
    #[serde(default)]
    pub users: BTreeMap<String, StoredCredential>,
    #[serde(default)]
    pub sessions: BTreeMap<String, StoredSession>,
}
