//! UserActor — Tokio actor owning the `users` collection
//!
//! Messages are handled one at a time, so each load → validate → mutate →
//! save span is exclusive: concurrent creates cannot drop each other's
//! records and id allocation cannot collide.
//!
//! Callers must have verified a bearer token first; the resulting
//! `SessionView` travels with each mutation for attribution only.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::SessionView;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::schema::COLLECTION_USERS;
use crate::store::FileStore;

use super::types::*;

// ─── Messages ───

enum UserMsg {
    List {
        reply: oneshot::Sender<Result<Vec<UserRecord>>>,
    },
    Get {
        id: String,
        reply: oneshot::Sender<Result<UserRecord>>,
    },
    Create {
        draft: UserDraft,
        by: SessionView,
        reply: oneshot::Sender<Result<UserRecord>>,
    },
    Update {
        id: String,
        draft: UserDraft,
        by: SessionView,
        reply: oneshot::Sender<Result<UserRecord>>,
    },
    Delete {
        id: String,
        by: SessionView,
        reply: oneshot::Sender<Result<UserRecord>>,
    },
}

// ─── Actor ───

/// Record service — processes user operations sequentially
pub struct UserActor {
    store: Arc<FileStore>,
    rx: mpsc::Receiver<UserMsg>,
}

impl UserActor {
    /// Spawn the user actor on its own store and return a handle
    pub async fn spawn(config: RegistryConfig) -> Result<UserHandle> {
        let store = Arc::new(FileStore::new(&config).await?);
        Ok(Self::spawn_with_store(store, &config))
    }

    /// Spawn with an existing FileStore (shared with the auth actor)
    pub fn spawn_with_store(store: Arc<FileStore>, config: &RegistryConfig) -> UserHandle {
        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        let actor = Self { store, rx };
        tokio::spawn(actor.run());
        info!("UserActor spawned");
        UserHandle { tx }
    }

    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                UserMsg::List { reply } => {
                    let _ = reply.send(self.load().await);
                }
                UserMsg::Get { id, reply } => {
                    let _ = reply.send(self.handle_get(&id).await);
                }
                UserMsg::Create { draft, by, reply } => {
                    let _ = reply.send(self.handle_create(draft, &by).await);
                }
                UserMsg::Update { id, draft, by, reply } => {
                    let _ = reply.send(self.handle_update(&id, draft, &by).await);
                }
                UserMsg::Delete { id, by, reply } => {
                    let _ = reply.send(self.handle_delete(&id, &by).await);
                }
            }
        }
        info!("UserActor stopped");
    }

    // ─── Handler Implementations ───

    async fn handle_get(&self, id: &str) -> Result<UserRecord> {
        let users = self.load().await?;
        users
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(not_found)
    }

    async fn handle_create(&self, draft: UserDraft, by: &SessionView) -> Result<UserRecord> {
        let valid = draft.validate()?;
        let mut users = self.load().await?;

        if users.iter().any(|u| u.email == valid.email) {
            return Err(email_conflict());
        }

        // Collision-checked inside the exclusive section
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !users.iter().any(|u| u.id == candidate) {
                break candidate;
            }
        };

        let now = Utc::now();
        let record = UserRecord {
            id,
            name: valid.name,
            email: valid.email,
            age: valid.age,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());

        self.store.save(COLLECTION_USERS, &users).await?;
        info!(id = %record.id, email = %record.email, by = %by.username, "User created");
        Ok(record)
    }

    async fn handle_update(&self, id: &str, draft: UserDraft, by: &SessionView) -> Result<UserRecord> {
        let mut users = self.load().await?;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(not_found)?;

        let valid = draft.validate()?;
        if users.iter().any(|u| u.email == valid.email && u.id != id) {
            return Err(email_conflict());
        }

        let previous = &users[index];
        let updated = UserRecord {
            id: previous.id.clone(),
            name: valid.name,
            email: valid.email,
            age: valid.age,
            created_at: previous.created_at,
            updated_at: next_timestamp(previous.updated_at),
        };
        users[index] = updated.clone();

        self.store.save(COLLECTION_USERS, &users).await?;
        info!(id = %updated.id, by = %by.username, "User updated");
        Ok(updated)
    }

    async fn handle_delete(&self, id: &str, by: &SessionView) -> Result<UserRecord> {
        let mut users = self.load().await?;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(not_found)?;
        let removed = users.remove(index);

        self.store.save(COLLECTION_USERS, &users).await?;
        info!(id = %removed.id, by = %by.username, "User deleted");
        Ok(removed)
    }

    // ─── Helpers ───

    async fn load(&self) -> Result<Vec<UserRecord>> {
        let users: Vec<UserRecord> = self.store.load(COLLECTION_USERS, Vec::new).await?;
        debug!(count = users.len(), "Loaded users");
        Ok(users)
    }
}

fn not_found() -> RegistryError {
    RegistryError::NotFound("User not found".into())
}

fn email_conflict() -> RegistryError {
    RegistryError::Conflict("Email already exists".into())
}

/// Strictly after `previous`, even on a coarse or stepped-back clock
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

// ─── Handle (client-facing API) ───

/// Thread-safe handle to communicate with the UserActor
#[derive(Clone)]
pub struct UserHandle {
    tx: mpsc::Sender<UserMsg>,
}

impl UserHandle {
    /// All records, insertion order
    pub async fn list(&self) -> Result<Vec<UserRecord>> {
        self.call(|reply| UserMsg::List { reply }).await
    }

    pub async fn get(&self, id: String) -> Result<UserRecord> {
        self.call(|reply| UserMsg::Get { id, reply }).await
    }

    pub async fn create(&self, draft: UserDraft, by: SessionView) -> Result<UserRecord> {
        self.call(|reply| UserMsg::Create { draft, by, reply }).await
    }

    /// Replace name, email and age; `createdAt` is kept
    pub async fn update(&self, id: String, draft: UserDraft, by: SessionView) -> Result<UserRecord> {
        self.call(|reply| UserMsg::Update { id, draft, by, reply }).await
    }

    /// Remove a record and return its last state. Not idempotent.
    pub async fn delete(&self, id: String, by: SessionView) -> Result<UserRecord> {
        self.call(|reply| UserMsg::Delete { id, by, reply }).await
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<Result<T>>) -> UserMsg) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| RegistryError::ActorUnavailable("UserActor".into()))?;
        rx.await
            .map_err(|_| RegistryError::ActorUnavailable("UserActor dropped".into()))?
    }
}
