use greenmart_core::{
    AccessTokenError, AccessTokens, CacheStore, Email, EmailClient, NewUser, OtpIdentity,
    OtpStrategy, Password, SmsClient, UserStore, UserStoreError, UserType,
};

use crate::otp::{OtpError, OtpLifecycle};
use crate::refresh_token::{RefreshTokenError, RefreshTokenLifecycle};
use crate::use_cases::login::IssuedSession;

#[derive(Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub display_name: Option<String>,
    pub email: Email,
    pub password: Password,
    pub otp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("User already exists with this email address")]
    EmailTaken,
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error(transparent)]
    UserStore(#[from] UserStoreError),
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
    #[error(transparent)]
    AccessToken(#[from] AccessTokenError),
}

/// Registration use case - OTP-verified account creation plus first login.
pub struct RegisterUseCase<'a, U, C, E, S, T>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
    T: AccessTokens,
{
    user_store: &'a U,
    otp: &'a OtpLifecycle<C, E, S>,
    refresh_tokens: &'a RefreshTokenLifecycle<C, T>,
    access_tokens: &'a T,
}

impl<'a, U, C, E, S, T> RegisterUseCase<'a, U, C, E, S, T>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
    T: AccessTokens,
{
    pub fn new(
        user_store: &'a U,
        otp: &'a OtpLifecycle<C, E, S>,
        refresh_tokens: &'a RefreshTokenLifecycle<C, T>,
        access_tokens: &'a T,
    ) -> Self {
        Self {
            user_store,
            otp,
            refresh_tokens,
            access_tokens,
        }
    }

    #[tracing::instrument(name = "RegisterUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        request: RegisterRequest,
        user_agent: &str,
    ) -> Result<IssuedSession, RegisterError> {
        if self
            .user_store
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(RegisterError::EmailTaken);
        }

        self.otp
            .verify_otp(
                OtpStrategy::Login,
                &OtpIdentity::Email(request.email.clone()),
                &request.otp,
            )
            .await?;

        let user = self
            .user_store
            .add_user(NewUser {
                name: request.name,
                display_name: request.display_name,
                email: request.email,
                password: request.password,
            })
            .await?;

        let refresh_token = self
            .refresh_tokens
            .issue(UserType::User, user.user_id, user_agent)
            .await?;
        let token = self.access_tokens.generate(user.user_id, user_agent)?;

        Ok(IssuedSession {
            user,
            token,
            refresh_token,
        })
    }
}
