//! In-memory credential store.
//!
//! Backs the integration-test harness so the full HTTP stack can run without
//! a database. Enforces the same email-uniqueness contract as the Postgres
//! store, under a single lock.

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use std::sync::RwLock;

use super::{CredentialStore, NewIdentity, UserIdentity};
use crate::error::StoreError;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<Vec<UserIdentity>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert_identity(&self, new: NewIdentity) -> Result<UserIdentity, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;

        if records.iter().any(|r| r.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let identity = UserIdentity {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            photo: new.photo,
            created_at: Utc::now(),
        };
        records.push(identity.clone());

        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserIdentity>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.iter().find(|r| r.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;

    fn new_identity(email: &str) -> NewIdentity {
        NewIdentity {
            username: "ana".to_string(),
            email: email.to_string(),
            password_hash: "$2b$10$placeholderhash".to_string(),
            role: Role::default(),
            photo: None,
        }
    }

    #[tokio::test]
    async fn inserted_identity_is_found_by_email_and_id() {
        let store = InMemoryCredentialStore::new();
        let created = store.insert_identity(new_identity("a@x.com")).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_and_store_unchanged() {
        let store = InMemoryCredentialStore::new();
        store.insert_identity(new_identity("a@x.com")).await.unwrap();

        let second = store.insert_identity(new_identity("a@x.com")).await;
        assert_eq!(second.unwrap_err(), StoreError::DuplicateEmail);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn unknown_email_yields_none() {
        let store = InMemoryCredentialStore::new();
        assert!(store.find_by_email("missing@x.com").await.unwrap().is_none());
    }
}
