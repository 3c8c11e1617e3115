//! Session authority — credentials, bearer tokens, and lazy expiry
//!
//! Owns the `auth` collection exclusively.

pub mod types;
pub mod actor;

pub use actor::{AuthActor, AuthHandle};
pub use types::{LoginOutcome, Role, SessionView};
