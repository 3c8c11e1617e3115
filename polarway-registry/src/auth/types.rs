//! Auth domain types — Role, SessionView, LoginOutcome
//!
//! Serializable, cloneable, and cheap to pass around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles carried by credentials and sessions
///
/// Passed through to clients; no operation branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of a session safe to hand back to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub username: String,
    pub role: Role,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    /// Opaque bearer token; shown once, stored only as a digest
    pub token: String,
    pub user: SessionView,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_login_outcome_wire_format() {
        let outcome = LoginOutcome {
            token: "abc".into(),
            user: SessionView {
                username: "admin".into(),
                role: Role::Admin,
            },
            expires_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["user"]["username"], "admin");
        assert_eq!(json["user"]["role"], "admin");
        assert_eq!(json["expiresAt"], 1_700_000_000_123i64);
        assert!(json.get("password").is_none());
    }
}
