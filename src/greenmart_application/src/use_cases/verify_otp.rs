use greenmart_core::{
    CacheStore, EmailClient, OtpIdentity, OtpStrategy, SmsClient, UserStore,
};

use crate::otp::OtpLifecycle;
use crate::use_cases::request_otp::RequestOtpError;

/// Standalone OTP verification, used by the edge to pre-check a code before
/// the registration form is submitted. Applies the same
/// already-registered guard as the request side.
pub struct VerifyOtpUseCase<'a, U, C, E, S>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    user_store: &'a U,
    otp: &'a OtpLifecycle<C, E, S>,
}

impl<'a, U, C, E, S> VerifyOtpUseCase<'a, U, C, E, S>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    pub fn new(user_store: &'a U, otp: &'a OtpLifecycle<C, E, S>) -> Self {
        Self { user_store, otp }
    }

    #[tracing::instrument(name = "VerifyOtpUseCase::execute", skip_all, fields(strategy = %strategy))]
    pub async fn execute(
        &self,
        strategy: OtpStrategy,
        identity: OtpIdentity,
        submitted: &str,
    ) -> Result<(), RequestOtpError> {
        if strategy == OtpStrategy::Login {
            let registered = match &identity {
                OtpIdentity::Email(email) => {
                    self.user_store.find_by_email(email).await?.is_some()
                }
                OtpIdentity::Mobile(_) => false,
            };
            if registered {
                return Err(RequestOtpError::AlreadyRegistered);
            }
        }

        self.otp.verify_otp(strategy, &identity, submitted).await?;
        Ok(())
    }
}
