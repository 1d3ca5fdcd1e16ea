//! Credential store: the persistence seam for user identity records.
//!
//! The store exclusively owns identity records. Flows only ever create
//! records and look them up; the password hash never leaves this layer except
//! inside a [`UserIdentity`] handed to the login flow for verification.

mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Authorization role attached to an identity. New registrations always get
/// the unprivileged default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unrecognized role: {}", other)),
        }
    }
}

/// A persisted identity record.
///
/// Deliberately not `Serialize`: response payloads are built explicitly in
/// the routes layer so the password hash can never be echoed by accident.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an identity. The id and creation timestamp are
/// assigned by the store.
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub photo: Option<String>,
}

/// Persistence port for identities. Email uniqueness is the implementation's
/// responsibility; a second insert for an existing email must fail with
/// [`StoreError::DuplicateEmail`] and leave the store unchanged.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_identity(&self, new: NewIdentity) -> Result<UserIdentity, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_string_form() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::User.as_str(), "user");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_defaults_to_unprivileged() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
    }
}
