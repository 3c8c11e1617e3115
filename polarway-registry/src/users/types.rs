//! User record types — the stored record and the client-supplied draft

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{RegistryError, Result};
use crate::validation;

/// User record as stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Server-generated, never changes
    pub id: String,
    pub name: String,
    /// Unique across the collection
    pub email: String,
    /// `None` is "not provided" and is omitted on the wire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied fields for create and update, unvalidated
///
/// `age` distinguishes an absent key (`None`) from an explicit `null`
/// (`Some(Value::Null)`), which is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A draft that passed validation, with the age normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub name: String,
    pub email: String,
    pub age: Option<u8>,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            age: None,
        }
    }

    pub fn with_age(mut self, age: impl Into<Value>) -> Self {
        self.age = Some(age.into());
        self
    }

    /// Check presence, email shape, then age
    pub fn validate(&self) -> Result<ValidDraft> {
        let (name, email) = match (self.name.as_deref(), self.email.as_deref()) {
            (Some(name), Some(email))
                if validation::validate_name(Some(name)) && !email.is_empty() =>
            {
                (name, email)
            }
            _ => {
                return Err(RegistryError::InvalidInput(
                    "Name and email are required".into(),
                ))
            }
        };

        if !validation::validate_email(email) {
            return Err(RegistryError::InvalidInput(
                "Email must contain @ symbol and be in valid format".into(),
            ));
        }

        let age = validation::parse_age(self.age.as_ref()).map_err(|_| {
            RegistryError::InvalidInput(
                "Age must be a valid number between 0 and 150, or omitted entirely".into(),
            )
        })?;

        Ok(ValidDraft {
            name: name.to_string(),
            email: email.to_string(),
            age,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_age_is_not_null_age() {
        let absent: UserDraft = serde_json::from_value(json!({"name": "A", "email": "a@b.com"})).unwrap();
        assert!(absent.age.is_none());
        assert_eq!(absent.validate().unwrap().age, None);

        let null: UserDraft =
            serde_json::from_value(json!({"name": "A", "email": "a@b.com", "age": null})).unwrap();
        assert_eq!(null.age, Some(Value::Null));
        assert!(null.validate().is_err());
    }

    #[test]
    fn test_validation_order() {
        let missing = UserDraft {
            name: Some("A".into()),
            ..Default::default()
        };
        match missing.validate() {
            Err(RegistryError::InvalidInput(msg)) => assert_eq!(msg, "Name and email are required"),
            other => panic!("unexpected: {other:?}"),
        }

        let bad_email = UserDraft::new("A", "nope").with_age(-5);
        match bad_email.validate() {
            Err(RegistryError::InvalidInput(msg)) => assert!(msg.starts_with("Email")),
            other => panic!("unexpected: {other:?}"),
        }

        let bad_age = UserDraft::new("A", "a@b.com").with_age("abc");
        match bad_age.validate() {
            Err(RegistryError::InvalidInput(msg)) => assert!(msg.starts_with("Age")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_record_omits_absent_age() {
        let now = Utc::now();
        let record = UserRecord {
            id: "1".into(),
            name: "A".into(),
            email: "a@b.com".into(),
            age: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("age").is_none());
        assert!(json.get("createdAt").is_some());

        let zero = UserRecord { age: Some(0), ..record };
        assert_eq!(serde_json::to_value(&zero).unwrap()["age"], 0);
    }
}
