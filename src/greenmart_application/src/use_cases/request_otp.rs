use greenmart_core::{
    CacheStore, EmailClient, OtpIdentity, OtpStrategy, SmsClient, UserStore, UserStoreError,
};

use crate::otp::{OtpError, OtpLifecycle};

#[derive(Debug)]
pub struct OtpRequestOutcome {
    pub is_existing: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestOtpError {
    #[error("User already exists with this email address, Please try login")]
    AlreadyRegistered,
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error(transparent)]
    UserStore(#[from] UserStoreError),
}

/// OTP request use case - guards the send with an account-existence check.
///
/// A login-strategy code is only for registration, so an already-registered
/// email is rejected; a reset-strategy code is sent regardless and the
/// caller learns whether the account exists.
pub struct RequestOtpUseCase<'a, U, C, E, S>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    user_store: &'a U,
    otp: &'a OtpLifecycle<C, E, S>,
}

impl<'a, U, C, E, S> RequestOtpUseCase<'a, U, C, E, S>
where
    U: UserStore,
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    pub fn new(user_store: &'a U, otp: &'a OtpLifecycle<C, E, S>) -> Self {
        Self { user_store, otp }
    }

    #[tracing::instrument(name = "RequestOtpUseCase::execute", skip_all, fields(strategy = %strategy))]
    pub async fn execute(
        &self,
        strategy: OtpStrategy,
        identity: OtpIdentity,
        silent: bool,
    ) -> Result<OtpRequestOutcome, RequestOtpError> {
        let is_existing = match &identity {
            OtpIdentity::Email(email) => self.user_store.find_by_email(email).await?.is_some(),
            OtpIdentity::Mobile(_) => false,
        };
        if strategy == OtpStrategy::Login && is_existing {
            return Err(RequestOtpError::AlreadyRegistered);
        }

        self.otp.send_otp(strategy, &identity, silent).await?;
        Ok(OtpRequestOutcome { is_existing })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::RwLock;

    use greenmart_core::{
        CacheStoreError, Email, Mobile, NewUser, Password, UserProfile,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct MapCache {
        entries: Arc<RwLock<HashMap<String, String>>>,
    }

    #[async_trait]
    impl CacheStore for MapCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
            Ok(self.entries.read().await.get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: Option<String>,
            _ttl_seconds: Option<u64>,
        ) -> Result<(), CacheStoreError> {
            if let Some(value) = value {
                self.entries.write().await.insert(key.to_string(), value);
            }
            Ok(())
        }

        async fn del(&self, key: &str) -> Result<(), CacheStoreError> {
            self.entries.write().await.remove(key);
            Ok(())
        }

        async fn scan(
            &self,
            _cursor: u64,
            _pattern: &str,
            _count: u64,
        ) -> Result<(u64, Vec<String>), CacheStoreError> {
            Ok((0, Vec::new()))
        }

        async fn del_many(&self, _keys: Vec<String>) -> Result<(), CacheStoreError> {
            Ok(())
        }
    }

    #[derive(Clone)]
    struct SingleUserStore {
        email: String,
    }

    #[async_trait]
    impl UserStore for SingleUserStore {
        async fn add_user(&self, _new_user: NewUser) -> Result<UserProfile, UserStoreError> {
            unimplemented!()
        }

        async fn find_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<UserProfile>, UserStoreError> {
            if email.as_str() == self.email {
                Ok(Some(UserProfile {
                    user_id: 1,
                    name: "Test".to_string(),
                    display_name: None,
                    email: email.clone(),
                    gender: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            } else {
                Ok(None)
            }
        }

        async fn find_by_id(&self, _user_id: i64) -> Result<Option<UserProfile>, UserStoreError> {
            unimplemented!()
        }

        async fn authenticate(
            &self,
            _email: &Email,
            _password: &Password,
        ) -> Result<UserProfile, UserStoreError> {
            unimplemented!()
        }

        async fn set_password(
            &self,
            _user_id: i64,
            _new_password: Password,
        ) -> Result<(), UserStoreError> {
            unimplemented!()
        }
    }

    #[derive(Clone, Default)]
    struct NullEmailClient;

    #[async_trait]
    impl EmailClient for NullEmailClient {
        async fn send_email(
            &self,
            _recipient: &Email,
            _subject: &str,
            _content: &str,
        ) -> Result<(), String> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct NullSmsClient;

    #[async_trait]
    impl SmsClient for NullSmsClient {
        async fn send_sms(&self, _recipient: &Mobile, _content: &str) -> Result<(), String> {
            Ok(())
        }
    }

    fn email(address: &str) -> Email {
        Email::try_from(address.to_string()).unwrap()
    }

    #[tokio::test]
    async fn login_otp_for_registered_email_is_rejected() {
        let store = SingleUserStore {
            email: "taken@example.com".to_string(),
        };
        let otp = OtpLifecycle::new(MapCache::default(), NullEmailClient, NullSmsClient);
        let use_case = RequestOtpUseCase::new(&store, &otp);

        let result = use_case
            .execute(
                OtpStrategy::Login,
                OtpIdentity::Email(email("taken@example.com")),
                true,
            )
            .await;
        assert!(matches!(result, Err(RequestOtpError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn reset_otp_for_registered_email_reports_existing() {
        let store = SingleUserStore {
            email: "taken@example.com".to_string(),
        };
        let otp = OtpLifecycle::new(MapCache::default(), NullEmailClient, NullSmsClient);
        let use_case = RequestOtpUseCase::new(&store, &otp);

        let outcome = use_case
            .execute(
                OtpStrategy::Reset,
                OtpIdentity::Email(email("taken@example.com")),
                true,
            )
            .await
            .unwrap();
        assert!(outcome.is_existing);
    }

    #[tokio::test]
    async fn login_otp_for_fresh_email_goes_through() {
        let store = SingleUserStore {
            email: "taken@example.com".to_string(),
        };
        let otp = OtpLifecycle::new(MapCache::default(), NullEmailClient, NullSmsClient);
        let use_case = RequestOtpUseCase::new(&store, &otp);

        let outcome = use_case
            .execute(
                OtpStrategy::Login,
                OtpIdentity::Email(email("new@example.com")),
                true,
            )
            .await
            .unwrap();
        assert!(!outcome.is_existing);
    }
}
