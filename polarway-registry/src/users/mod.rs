//! Record service — CRUD over user records
//!
//! Owns the `users` collection exclusively. Enforces email uniqueness and
//! field validation; authorization beyond "has a valid session" is not
//! applied.

pub mod types;
pub mod actor;

pub use actor::{UserActor, UserHandle};
pub use types::{UserDraft, UserRecord, ValidDraft};
