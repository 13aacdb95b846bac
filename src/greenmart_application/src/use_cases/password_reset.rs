use greenmart_core::{
    CacheStore, Email, EmailClient, OtpIdentity, OtpStrategy, Password, SmsClient, UserStore,
    UserStoreError,
};

use crate::otp::{OtpError, OtpLifecycle};

#[derive(Debug, thiserror::Error)]
pub enum ResetPasswordError {
    #[error("Could not find an account with this email address")]
    UnknownAccount,
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error(transparent)]
    UserStore(#[from] UserStoreError),
}

/// Password reset use case - OTP-verified hash replacement.
pub struct ResetPasswordUseCase<'a, U, C, E, S>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    user_store: &'a U,
    otp: &'a OtpLifecycle<C, E, S>,
}

impl<'a, U, C, E, S> ResetPasswordUseCase<'a, U, C, E, S>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    pub fn new(user_store: &'a U, otp: &'a OtpLifecycle<C, E, S>) -> Self {
        Self { user_store, otp }
    }

    #[tracing::instrument(name = "ResetPasswordUseCase::execute", skip_all)]
    pub async fn execute(
        &self,
        email: Email,
        otp: &str,
        new_password: Password,
    ) -> Result<(), ResetPasswordError> {
        let user = self
            .user_store
            .find_by_email(&email)
            .await?
            .ok_or(ResetPasswordError::UnknownAccount)?;

        self.otp
            .verify_otp(OtpStrategy::Reset, &OtpIdentity::Email(email), otp)
            .await?;

        self.user_store
            .set_password(user.user_id, new_password)
            .await?;
        Ok(())
    }
}
