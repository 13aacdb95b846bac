use async_trait::async_trait;
use thiserror::Error;

use crate::domain::email::Email;
use crate::domain::password::Password;
use crate::domain::user::{NewUser, UserProfile};

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("Bad credentials")]
    BadCredentials,
    #[error("User already exists with this email address")]
    EmailTaken,
    #[error("User not found")]
    UserNotFound,
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl PartialEq for UserStoreError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::BadCredentials, Self::BadCredentials) => true,
            (Self::EmailTaken, Self::EmailTaken) => true,
            (Self::UserNotFound, Self::UserNotFound) => true,
            (Self::Unexpected(_), Self::Unexpected(_)) => true,
            _ => false,
        }
    }
}

/// Account store used by the auth flows. Reads bypass the entity cache so
/// credentials are always checked against canonical rows; password hashing
/// and verification happen inside implementations and hashes never cross
/// this boundary.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn add_user(&self, new_user: NewUser) -> Result<UserProfile, UserStoreError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, UserStoreError>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserProfile>, UserStoreError>;

    /// Verifies credentials. Fails with `BadCredentials` both for a missing
    /// account and a wrong password.
    async fn authenticate(
        &self,
        email: &Email,
        password: &Password,
    ) -> Result<UserProfile, UserStoreError>;

    async fn set_password(
        &self,
        user_id: i64,
        new_password: Password,
    ) -> Result<(), UserStoreError>;
}
