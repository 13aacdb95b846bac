use greenmart_core::{
    AccessTokenError, AccessTokens, CacheStore, Email, Password, UserProfile, UserStore,
    UserStoreError, UserType,
};

use crate::refresh_token::{RefreshTokenError, RefreshTokenLifecycle};

/// Credentials accepted by the token endpoint.
#[derive(Debug)]
pub enum LoginCredentials {
    Password { email: Email, password: Password },
    RefreshToken { refresh_token: String },
}

/// Full session issued for a password login.
#[derive(Debug)]
pub struct IssuedSession {
    pub user: UserProfile,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug)]
pub enum LoginResponse {
    /// Password strategy: profile plus both tokens.
    Session(IssuedSession),
    /// Refresh strategy: only a fresh access token.
    AccessToken { token: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Account doesn't exist, Please create a new account")]
    UnknownAccount,
    #[error(transparent)]
    UserStore(#[from] UserStoreError),
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
    #[error(transparent)]
    AccessToken(#[from] AccessTokenError),
}

/// Login use case - exchanges credentials for tokens.
pub struct LoginUseCase<'a, U, C, T>
where
    U: UserStore,
    C: CacheStore,
    T: AccessTokens,
{
    user_store: &'a U,
    refresh_tokens: &'a RefreshTokenLifecycle<C, T>,
    access_tokens: &'a T,
}

impl<'a, U, C, T> LoginUseCase<'a, U, C, T>
where
    U: UserStore,
    C: CacheStore,
    T: AccessTokens,
{
    pub fn new(
        user_store: &'a U,
        refresh_tokens: &'a RefreshTokenLifecycle<C, T>,
        access_tokens: &'a T,
    ) -> Self {
        Self {
            user_store,
            refresh_tokens,
            access_tokens,
        }
    }

    #[tracing::instrument(name = "LoginUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        credentials: LoginCredentials,
        user_agent: &str,
    ) -> Result<LoginResponse, LoginError> {
        match credentials {
            LoginCredentials::Password { email, password } => {
                let user = self.user_store.authenticate(&email, &password).await?;

                let refresh_token = self
                    .refresh_tokens
                    .issue(UserType::User, user.user_id, user_agent)
                    .await?;
                let token = self.access_tokens.generate(user.user_id, user_agent)?;

                Ok(LoginResponse::Session(IssuedSession {
                    user,
                    token,
                    refresh_token,
                }))
            }
            LoginCredentials::RefreshToken { refresh_token } => {
                let user_id = self
                    .refresh_tokens
                    .verify(UserType::User, &refresh_token, user_agent)
                    .await?;
                let user = self
                    .user_store
                    .find_by_id(user_id)
                    .await?
                    .ok_or(LoginError::UnknownAccount)?;

                let token = self.access_tokens.generate(user.user_id, user_agent)?;
                Ok(LoginResponse::AccessToken { token })
            }
        }
    }
}
