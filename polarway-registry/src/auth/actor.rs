//! AuthActor — Tokio actor owning credentials and sessions
//!
//! All operations are processed sequentially via an mpsc channel, so every
//! load → check → mutate → save cycle on the `auth` collection is exclusive.
//! The users collection has its own actor and never contends with this one.
//!
//! Password checks stay out of the actor loop: a login takes a snapshot of
//! the stored hash, verifies it on the blocking pool from the caller's task,
//! and only then asks the actor to open a session. A slow Argon2 check never
//! delays a `verify` queued behind it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use polarway_registry::auth::AuthActor;
//! use polarway_registry::RegistryConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handle = AuthActor::spawn(RegistryConfig::new("/data/registry")).await?;
//!
//!     // Login with the seeded administrator → bearer token
//!     let outcome = handle.login("admin".into(), "password123".into()).await?;
//!
//!     // Verify on each request
//!     let who = handle.verify(outcome.token.clone()).await?;
//!     assert_eq!(who.username, "admin");
//!
//!     handle.logout(outcome.token).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::{HashCost, RegistryConfig, SeedCredential};
use crate::error::{RegistryError, Result};
use crate::schema::{AuthDocument, StoredCredential, StoredSession, COLLECTION_AUTH};
use crate::store::FileStore;

use super::types::*;

/// Random bytes per bearer token (hex-encoded to twice as many characters)
pub const TOKEN_BYTES: usize = 32;

// ─── Actor Messages ───

enum AuthMsg {
    Credential {
        username: String,
        reply: oneshot::Sender<Result<CredentialSnapshot>>,
    },
    OpenSession {
        username: String,
        reply: oneshot::Sender<Result<LoginOutcome>>,
    },
    Verify {
        token: String,
        reply: oneshot::Sender<Result<SessionView>>,
    },
    Logout {
        token: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    PurgeExpired {
        reply: oneshot::Sender<Result<usize>>,
    },
}

/// Hash to check a login password against
///
/// Unknown usernames get the actor's decoy hash, so both outcomes cost one
/// Argon2 verification.
struct CredentialSnapshot {
    password_hash: String,
    known: bool,
}

// ─── Actor ───

/// Session authority — processes auth operations sequentially
pub struct AuthActor {
    store: Arc<FileStore>,
    hash_cost: HashCost,
    session_ttl: Duration,
    decoy_hash: String,
    rx: mpsc::Receiver<AuthMsg>,
}

impl AuthActor {
    /// Spawn the auth actor on its own store and return a handle
    pub async fn spawn(config: RegistryConfig) -> Result<AuthHandle> {
        let store = Arc::new(FileStore::new(&config).await?);
        Self::spawn_with_store(store, &config).await
    }

    /// Spawn with an existing FileStore (shared with the users actor)
    ///
    /// Seeds the administrator credential before the first message is
    /// accepted, so a login can never observe an unseeded collection.
    pub async fn spawn_with_store(store: Arc<FileStore>, config: &RegistryConfig) -> Result<AuthHandle> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.mailbox_capacity);
        let decoy_hash = hash_password(config.hash_cost, generate_token()).await?;
        let actor = Self {
            store,
            hash_cost: config.hash_cost,
            session_ttl: config.session_ttl,
            decoy_hash,
            rx,
        };
        actor.seed(&config.seed_admin).await?;

        tokio::spawn(actor.run());
        info!("AuthActor spawned");
        Ok(AuthHandle { tx })
    }

    /// Main event loop
    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                AuthMsg::Credential { username, reply } => {
                    let _ = reply.send(self.handle_credential(&username).await);
                }
                AuthMsg::OpenSession { username, reply } => {
                    let _ = reply.send(self.handle_open_session(&username).await);
                }
                AuthMsg::Verify { token, reply } => {
                    let _ = reply.send(self.handle_verify(&token).await);
                }
                AuthMsg::Logout { token, reply } => {
                    let _ = reply.send(self.handle_logout(&token).await);
                }
                AuthMsg::PurgeExpired { reply } => {
                    let _ = reply.send(self.handle_purge_expired().await);
                }
            }
        }
        info!("AuthActor stopped");
    }

    // ─── Handler Implementations ───

    async fn seed(&self, seed: &SeedCredential) -> Result<()> {
        let mut doc = self.load().await?;
        if !doc.users.is_empty() {
            debug!(credentials = doc.users.len(), "Credentials present, skipping seed");
            return Ok(());
        }

        let password_hash = hash_password(self.hash_cost, seed.password.clone()).await?;
        doc.users.insert(
            seed.username.clone(),
            StoredCredential {
                username: seed.username.clone(),
                password_hash,
                role: seed.role,
            },
        );

        self.store.save(COLLECTION_AUTH, &doc).await?;
        info!(username = %seed.username, role = %seed.role, "Seeded administrator credential");
        Ok(())
    }

    async fn handle_credential(&self, username: &str) -> Result<CredentialSnapshot> {
        let doc = self.load().await?;
        Ok(match doc.users.get(username) {
            Some(credential) => CredentialSnapshot {
                password_hash: credential.password_hash.clone(),
                known: true,
            },
            None => CredentialSnapshot {
                password_hash: self.decoy_hash.clone(),
                known: false,
            },
        })
    }

    /// Called only after the password was verified against the snapshot
    async fn handle_open_session(&self, username: &str) -> Result<LoginOutcome> {
        let mut doc = self.load().await?;

        // The credential may have vanished since the snapshot
        let credential = doc
            .users
            .get(username)
            .ok_or(RegistryError::InvalidCredentials)?;

        let user = SessionView {
            username: credential.username.clone(),
            role: credential.role,
        };

        // Unique among active sessions
        let (token, token_hash) = loop {
            let token = generate_token();
            let token_hash = token_digest(&token);
            if !doc.sessions.contains_key(&token_hash) {
                break (token, token_hash);
            }
        };

        let expires_at = Utc::now() + self.session_ttl;
        doc.sessions.insert(
            token_hash,
            StoredSession {
                user: user.clone(),
                expires_at,
            },
        );

        self.store.save(COLLECTION_AUTH, &doc).await?;
        info!(username = %user.username, role = %user.role, %expires_at, "Login successful");

        Ok(LoginOutcome {
            token,
            user,
            expires_at,
        })
    }

    async fn handle_verify(&self, token: &str) -> Result<SessionView> {
        let doc = self.load().await?;
        let session = doc
            .sessions
            .get(&token_digest(token))
            .ok_or(RegistryError::Unauthenticated)?;

        if session.is_expired_at(Utc::now()) {
            debug!(username = %session.user.username, "Token expired");
            return Err(RegistryError::TokenExpired);
        }
        Ok(session.user.clone())
    }

    async fn handle_logout(&self, token: &str) -> Result<bool> {
        let mut doc = self.load().await?;
        match doc.sessions.remove(&token_digest(token)) {
            Some(session) => {
                self.store.save(COLLECTION_AUTH, &doc).await?;
                info!(username = %session.user.username, "Session revoked");
                Ok(true)
            }
            None => {
                debug!("Logout for unknown token");
                Ok(false)
            }
        }
    }

    async fn handle_purge_expired(&self) -> Result<usize> {
        let mut doc = self.load().await?;
        let now = Utc::now();
        let before = doc.sessions.len();
        doc.sessions.retain(|_, session| !session.is_expired_at(now));
        let purged = before - doc.sessions.len();

        if purged > 0 {
            self.store.save(COLLECTION_AUTH, &doc).await?;
            info!(purged, remaining = doc.sessions.len(), "Purged expired sessions");
        }
        Ok(purged)
    }

    // ─── Helpers ───

    async fn load(&self) -> Result<AuthDocument> {
        self.store.load(COLLECTION_AUTH, AuthDocument::default).await
    }
}

/// 32 bytes from the OS CSPRNG, hex-encoded
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Sessions are keyed by this digest; raw tokens never reach disk
pub fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

async fn hash_password(cost: HashCost, password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        let hash = cost.hasher()?.hash_password(password.as_bytes(), &salt)?;
        Ok::<_, RegistryError>(hash.to_string())
    })
    .await
    .map_err(|e| RegistryError::Internal(format!("hashing task failed: {e}")))?
}

/// Parameters are read back from the PHC string itself
async fn verify_password(password: String, stored_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)?;
        Ok::<_, RegistryError>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|e| RegistryError::Internal(format!("hashing task failed: {e}")))?
}

// ─── Handle (client-facing API) ───

/// Thread-safe handle to communicate with the AuthActor
#[derive(Clone)]
pub struct AuthHandle {
    tx: mpsc::Sender<AuthMsg>,
}

impl AuthHandle {
    /// Exchange a username/password pair for a bearer token
    ///
    /// Empty fields are rejected before any lookup. The Argon2 check runs
    /// on the blocking pool outside the actor.
    pub async fn login(&self, username: String, password: String) -> Result<LoginOutcome> {
        if username.is_empty() || password.is_empty() {
            return Err(RegistryError::InvalidInput(
                "Username and password are required".into(),
            ));
        }

        let snapshot = self
            .call(|reply| AuthMsg::Credential {
                username: username.clone(),
                reply,
            })
            .await?;
        let matches = verify_password(password, snapshot.password_hash).await?;

        if !snapshot.known {
            warn!(username = %username, "Login rejected: unknown username");
            return Err(RegistryError::InvalidCredentials);
        }
        if !matches {
            warn!(username = %username, "Login rejected: wrong password");
            return Err(RegistryError::InvalidCredentials);
        }

        self.call(|reply| AuthMsg::OpenSession { username, reply }).await
    }

    /// Resolve a bearer token to its session view
    ///
    /// Unknown tokens fail with `Unauthenticated`, expired ones with
    /// `TokenExpired`. Lifetime is fixed; verification never extends it.
    pub async fn verify(&self, token: String) -> Result<SessionView> {
        self.call(|reply| AuthMsg::Verify { token, reply }).await
    }

    /// Revoke a session. Returns whether a session was removed.
    pub async fn logout(&self, token: String) -> Result<bool> {
        self.call(|reply| AuthMsg::Logout { token, reply }).await
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        self.call(|reply| AuthMsg::PurgeExpired { reply }).await
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<Result<T>>) -> AuthMsg) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| RegistryError::ActorUnavailable("AuthActor".into()))?;
        rx.await
            .map_err(|_| RegistryError::ActorUnavailable("AuthActor dropped".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_digest_is_stable() {
        assert_eq!(token_digest("abc"), token_digest("abc"));
        assert_ne!(token_digest("abc"), token_digest("abd"));
        assert_eq!(token_digest("abc").len(), 64);
    }

    #[tokio::test]
    async fn test_password_hash_round_trip() {
        let hash = hash_password(HashCost::minimal(), "s3cret".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("S3cret".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_username_gets_decoy_hash() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = RegistryConfig::new(dir.path()).with_hash_cost(HashCost::minimal());
        let handle = AuthActor::spawn(config).await.unwrap();

        let snapshot = handle
            .call(|reply| AuthMsg::Credential {
                username: "mallory".into(),
                reply,
            })
            .await
            .unwrap();
        assert!(!snapshot.known);
        assert!(snapshot.password_hash.starts_with("$argon2id$"));
        assert!(!verify_password("password123".into(), snapshot.password_hash).await.unwrap());

        let known = handle
            .call(|reply| AuthMsg::Credential {
                username: "admin".into(),
                reply,
            })
            .await
            .unwrap();
        assert!(known.known);
    }
}
