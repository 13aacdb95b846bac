use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use secrecy::ExposeSecret;
use tokio::sync::RwLock;

use greenmart_core::{
    Email, NewUser, Password, UserProfile, UserStore, UserStoreError,
};

struct StoredUser {
    profile: UserProfile,
    password: String,
}

/// HashMap-backed user store for tests. Passwords are compared in plain
/// text; real hashing lives in the Postgres adapter.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<i64, StoredUser>>>,
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn add_user(&self, new_user: NewUser) -> Result<UserProfile, UserStoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|stored| stored.profile.email == new_user.email)
        {
            return Err(UserStoreError::EmailTaken);
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;

        let now = Utc::now();
        let profile = UserProfile {
            user_id: *next_id,
            name: new_user.name,
            display_name: new_user.display_name,
            email: new_user.email,
            gender: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            *next_id,
            StoredUser {
                profile: profile.clone(),
                password: new_user.password.as_ref().expose_secret().clone(),
            },
        );
        Ok(profile)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<UserProfile>, UserStoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|stored| &stored.profile.email == email)
            .map(|stored| stored.profile.clone()))
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserProfile>, UserStoreError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|stored| stored.profile.clone()))
    }

    async fn authenticate(
        &self,
        email: &Email,
        password: &Password,
    ) -> Result<UserProfile, UserStoreError> {
        let users = self.users.read().await;
        let stored = users
            .values()
            .find(|stored| &stored.profile.email == email)
            .ok_or(UserStoreError::BadCredentials)?;

        if stored.password != *password.as_ref().expose_secret() {
            return Err(UserStoreError::BadCredentials);
        }
        Ok(stored.profile.clone())
    }

    async fn set_password(
        &self,
        user_id: i64,
        new_password: Password,
    ) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&user_id).ok_or(UserStoreError::UserNotFound)?;
        stored.password = new_password.as_ref().expose_secret().clone();
        stored.profile.updated_at = Utc::now();
        Ok(())
    }
}
