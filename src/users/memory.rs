use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: HashMap<i64, User>,
}

/// Test store. The uniqueness check and the insert happen under one guard,
/// matching what the database constraint gives the Postgres store.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a row behind the service's back, as an operator would.
    pub async fn remove(&self, id: i64) {
        self.inner.lock().await.rows.remove(&id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().await.rows.get(&id).cloned())
    }

    async fn create(&self, new_user: NewUser<'_>) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.rows.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            full_name: new_user.full_name.to_string(),
            email: new_user.email.to_string(),
            password_hash: new_user.password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_full_name(&self, id: i64, full_name: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.rows.get_mut(&id) {
            Some(user) => {
                user.full_name = full_name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            full_name: "Jane Doe",
            email,
            password_hash: "$argon2id$fake",
        }
    }

    #[tokio::test]
    async fn assigns_increasing_ids() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.unwrap();
        let b = store.create(new_user("b@x.com")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("jane@x.com")).await.unwrap();
        let err = store.create(new_user("jane@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn email_match_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create(new_user("jane@x.com")).await.unwrap();
        assert!(store.find_by_email("Jane@x.com").await.unwrap().is_none());
        assert!(store.create(new_user("Jane@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn update_missing_row_reports_false() {
        let store = MemoryUserStore::new();
        assert!(!store.update_full_name(99, "Nobody").await.unwrap());
    }
}
