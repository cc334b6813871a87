use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{StoreError, UserStore};
use crate::models::User;

#[derive(Default)]
struct UserTable {
    by_id: HashMap<String, User>,
    // lowercased email -> user id
    by_email: HashMap<String, String>,
}

/// In-memory user store.
///
/// The email check and the insert happen under one write lock, so two
/// registrations racing on the same address cannot both succeed.
#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<UserTable>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.table.read().await.by_id.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let email_key = user.email.to_lowercase();
        let mut table = self.table.write().await;

        if table.by_email.contains_key(&email_key) {
            return Err(StoreError::Conflict(format!(
                "user with email {} already exists",
                user.email
            )));
        }
        if table.by_id.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!(
                "user with id {} already exists",
                user.id
            )));
        }

        debug!("Storing user id={} agency={}", user.id, user.agency_id);
        table.by_email.insert(email_key, user.id.clone());
        table.by_id.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let table = self.table.read().await;
        table
            .by_email
            .get(&email.to_lowercase())
            .and_then(|id| table.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user with email {}", email)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_str;
    use std::sync::Arc;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            phone: None,
            agency_id: "agency-1".to_string(),
            password_hash: "hash".to_string(),
            created_at: now_str(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = MemoryUserStore::new();
        store.create_user(user("u1", "Pat@Example.com")).await.unwrap();

        let user = store.get_user_by_email("pat@example.com").await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.email, "Pat@Example.com");
        assert!(matches!(
            store.get_user_by_email("missing@example.com").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryUserStore::new();
        store.create_user(user("u1", "pat@example.com")).await.unwrap();

        let result = store.create_user(user("u2", "PAT@example.com")).await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_email_single_winner() {
        let store = Arc::new(MemoryUserStore::new());

        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_user(user(&format!("u{}", i), "race@example.com"))
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(store.count().await, 1);
    }
}
