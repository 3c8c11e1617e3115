//! # Polarway Registry
//!
//! Session-authenticated user registry for Polarway — durable JSON
//! collections, bearer-token sessions, and a REST API on axum.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │              HTTP (axum)                  │
//! │   /api/auth/*        /api/users/*         │
//! ├─────────────────────┬─────────────────────┤
//! │     AuthActor       │     UserActor       │
//! │ (credentials,       │ (user records,      │
//! │  sessions, verify)  │  uniqueness, CRUD)  │
//! ├─────────────────────┴─────────────────────┤
//! │               FileStore                   │
//! │  (auth.json, users.json — atomic replace) │
//! └───────────────────────────────────────────┘
//! ```
//!
//! Each actor owns one collection and handles its messages one at a time,
//! so every read-modify-write is serialized per collection while the two
//! collections never contend with each other.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polarway_registry::{AppState, RegistryConfig, UserDraft};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RegistryConfig::new("/data/registry");
//!     let state = AppState::start(&config).await?;
//!
//!     let login = state.auth.login("admin".into(), "password123".into()).await?;
//!     let who = state.auth.verify(login.token).await?;
//!
//!     let user = state
//!         .users
//!         .create(UserDraft::new("Alice", "alice@example.com").with_age(30), who)
//!         .await?;
//!     println!("created {}", user.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Durable writes**: temp file + fsync + atomic rename per save
//! - **No lost updates**: per-collection actors serialize read-modify-write
//! - **Unguessable tokens**: 256-bit CSPRNG tokens, stored only as SHA-256 digests
//! - **Hashed credentials**: Argon2id PHC strings, never plaintext
//! - **Railway Programming**: All operations return `Result<T, RegistryError>`

pub mod config;
pub mod error;
pub mod schema;
pub mod store;
pub mod validation;
pub mod maintenance;
pub mod http;

pub mod auth;
pub mod users;

// Re-exports for convenience
pub use config::{HashCost, RegistryConfig};
pub use error::{RegistryError, Result};
pub use store::FileStore;
pub use maintenance::MaintenanceScheduler;
pub use http::{router, serve, AppState};

pub use auth::{AuthActor, AuthHandle, LoginOutcome, Role, SessionView};
pub use users::{UserActor, UserDraft, UserHandle, UserRecord};
