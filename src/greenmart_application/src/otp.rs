use chrono::{DateTime, Utc};

use greenmart_core::keys;
use greenmart_core::{
    CacheStore, CacheStoreError, EmailClient, OtpCode, OtpIdentity, OtpOverride, OtpStrategy,
    SmsClient,
};

/// Lifetime of a one-time code; expiry is enforced by the cache backend's
/// TTL, not by this module.
pub const OTP_TTL_SECONDS: u64 = 300;

/// Minimum gap between two outbound deliveries for one (strategy, identity).
pub const OTP_RESEND_COOLDOWN_SECONDS: i64 = 30;

const SENDER_NAME: &str = "Greenmart";

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Please send the otp request after {seconds_remaining} seconds")]
    Cooldown { seconds_remaining: i64 },
    #[error("Please check your OTP, entered details are incorrect")]
    IncorrectCode,
    #[error("Failed to deliver OTP: {0}")]
    Delivery(String),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheStoreError),
}

/// One-time-code lifecycle per (strategy, identity).
///
/// At most one live code exists per pair; re-requesting within the code's
/// TTL re-sends the same code, and a short-TTL marker throttles deliveries
/// to one per cooldown window. Verification accepts the stored code or,
/// when configured, the deterministic override code - but only while a real
/// code is live.
pub struct OtpLifecycle<C, E, S>
where
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    cache: C,
    email_client: E,
    sms_client: S,
    override_code: Option<OtpOverride>,
}

impl<C, E, S> OtpLifecycle<C, E, S>
where
    C: CacheStore,
    E: EmailClient,
    S: SmsClient,
{
    pub fn new(cache: C, email_client: E, sms_client: S) -> Self {
        Self {
            cache,
            email_client,
            sms_client,
            override_code: None,
        }
    }

    /// Enables the override path. Left unset in production configurations.
    pub fn with_override_code(mut self, override_code: OtpOverride) -> Self {
        self.override_code = Some(override_code);
        self
    }

    #[tracing::instrument(name = "OtpLifecycle::send_otp", skip(self), fields(strategy = %strategy))]
    pub async fn send_otp(
        &self,
        strategy: OtpStrategy,
        identity: &OtpIdentity,
        silent: bool,
    ) -> Result<OtpCode, OtpError> {
        let marker_key = keys::otp_last_request_key(strategy, identity);
        if let Some(marker) = self.cache.get(&marker_key).await? {
            return Err(OtpError::Cooldown {
                seconds_remaining: remaining_cooldown(&marker, Utc::now()),
            });
        }

        let code = self.live_or_fresh_code(strategy, identity).await?;

        if !silent {
            self.deliver(strategy, identity, &code).await?;
        }

        self.cache
            .set(
                &marker_key,
                Some(Utc::now().to_rfc3339()),
                Some(OTP_RESEND_COOLDOWN_SECONDS as u64),
            )
            .await?;

        Ok(code)
    }

    #[tracing::instrument(name = "OtpLifecycle::verify_otp", skip(self, submitted), fields(strategy = %strategy))]
    pub async fn verify_otp(
        &self,
        strategy: OtpStrategy,
        identity: &OtpIdentity,
        submitted: &str,
    ) -> Result<(), OtpError> {
        let code_key = keys::otp_code_key(strategy, identity);
        let Some(stored) = self.cache.get(&code_key).await? else {
            return Err(OtpError::IncorrectCode);
        };

        if stored == submitted {
            return Ok(());
        }
        if let Some(override_code) = &self.override_code {
            if override_code.current(Utc::now()).as_str() == submitted {
                return Ok(());
            }
        }
        Err(OtpError::IncorrectCode)
    }

    /// Returns the live code for the pair, generating and storing a fresh
    /// one only when none exists.
    async fn live_or_fresh_code(
        &self,
        strategy: OtpStrategy,
        identity: &OtpIdentity,
    ) -> Result<OtpCode, OtpError> {
        let code_key = keys::otp_code_key(strategy, identity);
        if let Some(live) = self.cache.get(&code_key).await? {
            if let Ok(code) = OtpCode::parse(&live) {
                return Ok(code);
            }
        }

        let code = OtpCode::generate();
        self.cache
            .set(
                &code_key,
                Some(code.as_str().to_string()),
                Some(OTP_TTL_SECONDS),
            )
            .await?;
        Ok(code)
    }

    async fn deliver(
        &self,
        strategy: OtpStrategy,
        identity: &OtpIdentity,
        code: &OtpCode,
    ) -> Result<(), OtpError> {
        let subject = match strategy {
            OtpStrategy::Login => "Your login code",
            OtpStrategy::Reset => "Your password reset code",
        };
        let content = format!("Your {SENDER_NAME} one-time code is {code}");

        match identity {
            OtpIdentity::Email(email) => self
                .email_client
                .send_email(email, subject, &content)
                .await
                .map_err(OtpError::Delivery),
            OtpIdentity::Mobile(mobile) => self
                .sms_client
                .send_sms(mobile, &content)
                .await
                .map_err(OtpError::Delivery),
        }
    }
}

/// Seconds left in the cooldown window opened at `marker` (an RFC 3339
/// timestamp). Clamped to the window so a corrupt marker still reports a
/// sane value.
fn remaining_cooldown(marker: &str, now: DateTime<Utc>) -> i64 {
    let elapsed = DateTime::parse_from_rfc3339(marker)
        .map(|issued_at| (now - issued_at.with_timezone(&Utc)).num_seconds())
        .unwrap_or(0);
    (OTP_RESEND_COOLDOWN_SECONDS - elapsed).clamp(1, OTP_RESEND_COOLDOWN_SECONDS)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use greenmart_core::{Email, Mobile};

    use super::*;

    /// Plain map-backed cache; TTLs are ignored, which is enough for the
    /// paths under test here. Time-dependent expiry is covered by the
    /// adapter-level tests against the in-memory cache store.
    #[derive(Clone, Default)]
    struct MapCache {
        entries: Arc<RwLock<HashMap<String, String>>>,
    }

    #[async_trait::async_trait]
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

    #[derive(Clone, Default)]
    struct CountingEmailClient {
        sent: Arc<RwLock<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl EmailClient for CountingEmailClient {
        async fn send_email(
            &self,
            recipient: &Email,
            _subject: &str,
            _content: &str,
        ) -> Result<(), String> {
            self.sent.write().await.push(recipient.as_str().to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingSmsClient {
        sent: Arc<RwLock<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl SmsClient for CountingSmsClient {
        async fn send_sms(&self, recipient: &Mobile, _content: &str) -> Result<(), String> {
            self.sent.write().await.push(recipient.as_str().to_string());
            Ok(())
        }
    }

    fn lifecycle() -> (
        OtpLifecycle<MapCache, CountingEmailClient, CountingSmsClient>,
        CountingEmailClient,
    ) {
        let email_client = CountingEmailClient::default();
        let lifecycle = OtpLifecycle::new(
            MapCache::default(),
            email_client.clone(),
            CountingSmsClient::default(),
        );
        (lifecycle, email_client)
    }

    fn email_identity() -> OtpIdentity {
        OtpIdentity::Email(Email::try_from("a@b.com".to_string()).unwrap())
    }

    #[tokio::test]
    async fn second_send_within_the_window_hits_the_cooldown() {
        let (lifecycle, email_client) = lifecycle();
        let identity = email_identity();

        lifecycle
            .send_otp(OtpStrategy::Login, &identity, false)
            .await
            .unwrap();
        let second = lifecycle
            .send_otp(OtpStrategy::Login, &identity, false)
            .await;

        match second {
            Err(OtpError::Cooldown { seconds_remaining }) => {
                assert!(seconds_remaining > 0);
                assert!(seconds_remaining <= OTP_RESEND_COOLDOWN_SECONDS);
            }
            other => panic!("expected cooldown, got {other:?}"),
        }
        assert_eq!(email_client.sent.read().await.len(), 1);
    }

    #[tokio::test]
    async fn strategies_throttle_independently() {
        let (lifecycle, _) = lifecycle();
        let identity = email_identity();

        lifecycle
            .send_otp(OtpStrategy::Login, &identity, true)
            .await
            .unwrap();
        let reset = lifecycle.send_otp(OtpStrategy::Reset, &identity, true).await;
        assert!(reset.is_ok());
    }

    #[tokio::test]
    async fn silent_send_skips_delivery_but_stores_the_code() {
        let (lifecycle, email_client) = lifecycle();
        let identity = email_identity();

        let code = lifecycle
            .send_otp(OtpStrategy::Login, &identity, true)
            .await
            .unwrap();

        assert!(email_client.sent.read().await.is_empty());
        assert!(
            lifecycle
                .verify_otp(OtpStrategy::Login, &identity, code.as_str())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn verify_rejects_wrong_and_absent_codes() {
        let (lifecycle, _) = lifecycle();
        let identity = email_identity();

        // Nothing stored yet.
        let missing = lifecycle
            .verify_otp(OtpStrategy::Login, &identity, "123456")
            .await;
        assert!(matches!(missing, Err(OtpError::IncorrectCode)));

        lifecycle
            .send_otp(OtpStrategy::Login, &identity, true)
            .await
            .unwrap();
        let wrong = lifecycle
            .verify_otp(OtpStrategy::Login, &identity, "000000")
            .await;
        assert!(matches!(wrong, Err(OtpError::IncorrectCode)));
    }

    #[tokio::test]
    async fn override_code_requires_a_live_stored_code() {
        let override_code = OtpOverride::new(secrecy::Secret::from("shared".to_string()));
        let lifecycle = OtpLifecycle::new(
            MapCache::default(),
            CountingEmailClient::default(),
            CountingSmsClient::default(),
        )
        .with_override_code(override_code.clone());
        let identity = email_identity();
        let current = override_code.current(Utc::now());

        // No live code: the override is not a standing backdoor.
        let without_live = lifecycle
            .verify_otp(OtpStrategy::Login, &identity, current.as_str())
            .await;
        assert!(matches!(without_live, Err(OtpError::IncorrectCode)));

        lifecycle
            .send_otp(OtpStrategy::Login, &identity, true)
            .await
            .unwrap();
        let current = override_code.current(Utc::now());
        let with_live = lifecycle
            .verify_otp(OtpStrategy::Login, &identity, current.as_str())
            .await;
        assert!(with_live.is_ok());
    }

    #[test]
    fn remaining_cooldown_counts_down_and_clamps() {
        let now = Utc::now();
        let marker = (now - chrono::Duration::seconds(10)).to_rfc3339();
        assert_eq!(remaining_cooldown(&marker, now), 20);

        let stale = (now - chrono::Duration::seconds(500)).to_rfc3339();
        assert_eq!(remaining_cooldown(&stale, now), 1);

        assert_eq!(remaining_cooldown("not a timestamp", now), OTP_RESEND_COOLDOWN_SECONDS);
    }
}
