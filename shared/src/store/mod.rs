use async_trait::async_trait;
use thiserror::Error;

use crate::models::User;

pub mod memory;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Storage for agency users created through self-registration.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts `user`, failing with `StoreError::Conflict` if the email is taken.
    async fn create_user(&self, user: User) -> Result<User, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;
}
