use greenmart_core::{AccessTokens, CacheStore, UserType};

use crate::refresh_token::{RefreshTokenError, RefreshTokenLifecycle};

#[derive(Debug, thiserror::Error)]
pub enum LogoutError {
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
}

/// Logout use case - drops the caller's refresh-token lineage.
pub struct LogoutUseCase<'a, C, T>
where
    C: CacheStore,
    T: AccessTokens,
{
    refresh_tokens: &'a RefreshTokenLifecycle<C, T>,
}

impl<'a, C, T> LogoutUseCase<'a, C, T>
where
    C: CacheStore,
    T: AccessTokens,
{
    pub fn new(refresh_tokens: &'a RefreshTokenLifecycle<C, T>) -> Self {
        Self { refresh_tokens }
    }

    #[tracing::instrument(name = "LogoutUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: i64) -> Result<(), LogoutError> {
        self.refresh_tokens.clear(UserType::User, user_id).await?;
        Ok(())
    }
}
