use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use greenmart_core::keys;
use greenmart_core::{
    AccessTokens, CacheStore, CacheStoreError, FingerprintHash, UserType,
};

/// Lifetime of an inactive refresh session; refreshed on every successful
/// reuse.
pub const REFRESH_TOKEN_TTL_SECONDS: u64 = 5 * 24 * 60 * 60;

const TOKEN_RANDOM_LENGTH: usize = 126;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Bad credentials")]
    Rejected,
    #[error("Cache error: {0}")]
    Cache(#[from] CacheStoreError),
}

/// Forward-index payload: the live token of a lineage and the fingerprint
/// it is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LineageRecord {
    token: String,
    fingerprint: FingerprintHash,
}

/// Long-lived refresh tokens, one lineage per (user type, user id).
///
/// Each lineage keeps two cache entries: a forward index from the user to
/// its live token + fingerprint, and a reverse index from the token back to
/// the user. A matching fingerprint extends the lineage; a different
/// fingerprint replaces it, so one principal holds at most one live refresh
/// session per user type across all devices (single-slot, intentional).
pub struct RefreshTokenLifecycle<C, T>
where
    C: CacheStore,
    T: AccessTokens,
{
    cache: C,
    tokens: T,
}

impl<C, T> RefreshTokenLifecycle<C, T>
where
    C: CacheStore,
    T: AccessTokens,
{
    pub fn new(cache: C, tokens: T) -> Self {
        Self { cache, tokens }
    }

    #[tracing::instrument(name = "RefreshTokenLifecycle::issue", skip_all, fields(user_id))]
    pub async fn issue(
        &self,
        user_type: UserType,
        user_id: i64,
        user_agent: &str,
    ) -> Result<String, RefreshTokenError> {
        let fingerprint = self.tokens.hash_fingerprint(user_agent);
        let forward_key = keys::refresh_forward_key(user_type, user_id);

        if let Some(raw) = self.cache.get(&forward_key).await? {
            if let Ok(record) = serde_json::from_str::<LineageRecord>(&raw) {
                if record.fingerprint == fingerprint {
                    // Same device: extend the existing lineage.
                    self.write_lineage(user_type, user_id, &record).await?;
                    return Ok(record.token);
                }
                // Different device: retire the stale lineage, reverse index
                // included, before minting its replacement.
                self.cache
                    .del(&keys::refresh_reverse_key(user_type, &record.token))
                    .await?;
            }
        }

        let record = LineageRecord {
            token: mint_token(),
            fingerprint,
        };
        self.write_lineage(user_type, user_id, &record).await?;
        Ok(record.token)
    }

    #[tracing::instrument(name = "RefreshTokenLifecycle::verify", skip_all)]
    pub async fn verify(
        &self,
        user_type: UserType,
        token: &str,
        user_agent: &str,
    ) -> Result<i64, RefreshTokenError> {
        let Some(raw_user_id) = self
            .cache
            .get(&keys::refresh_reverse_key(user_type, token))
            .await?
        else {
            return Err(RefreshTokenError::Rejected);
        };
        let Ok(user_id) = raw_user_id.parse::<i64>() else {
            return Err(RefreshTokenError::Rejected);
        };

        let forward_key = keys::refresh_forward_key(user_type, user_id);
        let Some(raw) = self.cache.get(&forward_key).await? else {
            return Err(RefreshTokenError::Rejected);
        };
        let Ok(record) = serde_json::from_str::<LineageRecord>(&raw) else {
            return Err(RefreshTokenError::Rejected);
        };

        if record.fingerprint != self.tokens.hash_fingerprint(user_agent) {
            // Replayed or stolen token: kill the whole lineage.
            self.clear(user_type, user_id).await?;
            return Err(RefreshTokenError::Rejected);
        }

        self.write_lineage(user_type, user_id, &record).await?;
        Ok(user_id)
    }

    #[tracing::instrument(name = "RefreshTokenLifecycle::clear", skip_all, fields(user_id))]
    pub async fn clear(&self, user_type: UserType, user_id: i64) -> Result<(), RefreshTokenError> {
        let forward_key = keys::refresh_forward_key(user_type, user_id);
        if let Some(raw) = self.cache.get(&forward_key).await? {
            if let Ok(record) = serde_json::from_str::<LineageRecord>(&raw) {
                self.cache
                    .del(&keys::refresh_reverse_key(user_type, &record.token))
                    .await?;
            }
        }
        self.cache.del(&forward_key).await?;
        Ok(())
    }

    /// Writes both indices with a fresh TTL.
    async fn write_lineage(
        &self,
        user_type: UserType,
        user_id: i64,
        record: &LineageRecord,
    ) -> Result<(), RefreshTokenError> {
        let payload = serde_json::to_string(record)
            .map_err(|error| CacheStoreError::Backend(error.to_string()))?;
        self.cache
            .set(
                &keys::refresh_forward_key(user_type, user_id),
                Some(payload),
                Some(REFRESH_TOKEN_TTL_SECONDS),
            )
            .await?;
        self.cache
            .set(
                &keys::refresh_reverse_key(user_type, &record.token),
                Some(user_id.to_string()),
                Some(REFRESH_TOKEN_TTL_SECONDS),
            )
            .await?;
        Ok(())
    }
}

/// High-entropy opaque token: timestamp, alphanumeric body, numeric suffix.
fn mint_token() -> String {
    let mut rng = rand::rng();
    let body: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LENGTH)
        .map(char::from)
        .collect();
    let suffix: u32 = rng.random_range(1..=99_999);
    format!("{}_{body}_{suffix}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use greenmart_core::AccessTokenError;

    use super::*;

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

    /// Transparent fingerprint hasher so tests can reason about identities.
    #[derive(Clone)]
    struct PlainHasher;

    impl AccessTokens for PlainHasher {
        fn generate(&self, user_id: i64, _user_agent: &str) -> Result<String, AccessTokenError> {
            Ok(format!("access-{user_id}"))
        }

        fn verify(&self, _token: &str, _user_agent: &str) -> Result<i64, AccessTokenError> {
            Err(AccessTokenError::Invalid)
        }

        fn hash_fingerprint(&self, user_agent: &str) -> FingerprintHash {
            FingerprintHash::new(format!("fp:{user_agent}"))
        }
    }

    fn lifecycle() -> RefreshTokenLifecycle<MapCache, PlainHasher> {
        RefreshTokenLifecycle::new(MapCache::default(), PlainHasher)
    }

    #[tokio::test]
    async fn issue_then_verify_round_trips_the_user_id() {
        let lifecycle = lifecycle();
        let token = lifecycle.issue(UserType::User, 7, "device-a").await.unwrap();

        let user_id = lifecycle
            .verify(UserType::User, &token, "device-a")
            .await
            .unwrap();
        assert_eq!(user_id, 7);
    }

    #[tokio::test]
    async fn matching_fingerprint_extends_instead_of_minting() {
        let lifecycle = lifecycle();
        let first = lifecycle.issue(UserType::User, 7, "device-a").await.unwrap();
        let second = lifecycle.issue(UserType::User, 7, "device-a").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn new_fingerprint_replaces_the_lineage_and_retires_the_old_token() {
        let lifecycle = lifecycle();
        let first = lifecycle.issue(UserType::User, 7, "device-a").await.unwrap();
        let second = lifecycle.issue(UserType::User, 7, "device-b").await.unwrap();
        assert_ne!(first, second);

        // The replaced token no longer resolves.
        let replaced = lifecycle.verify(UserType::User, &first, "device-a").await;
        assert!(matches!(replaced, Err(RefreshTokenError::Rejected)));

        // The replacement still does.
        assert!(
            lifecycle
                .verify(UserType::User, &second, "device-b")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn fingerprint_mismatch_clears_the_whole_lineage() {
        let lifecycle = lifecycle();
        let token = lifecycle.issue(UserType::User, 7, "device-a").await.unwrap();

        let stolen = lifecycle.verify(UserType::User, &token, "device-b").await;
        assert!(matches!(stolen, Err(RefreshTokenError::Rejected)));

        // The lineage is gone for the legitimate device as well.
        let original = lifecycle.verify(UserType::User, &token, "device-a").await;
        assert!(matches!(original, Err(RefreshTokenError::Rejected)));
    }

    #[tokio::test]
    async fn clear_removes_both_indices() {
        let lifecycle = lifecycle();
        let token = lifecycle.issue(UserType::User, 7, "device-a").await.unwrap();

        lifecycle.clear(UserType::User, 7).await.unwrap();

        let verify = lifecycle.verify(UserType::User, &token, "device-a").await;
        assert!(matches!(verify, Err(RefreshTokenError::Rejected)));
        assert!(lifecycle.cache.entries.read().await.is_empty());
    }

    #[test]
    fn minted_tokens_have_the_documented_shape() {
        let token = mint_token();
        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().is_ok());
        assert_eq!(parts[1].len(), TOKEN_RANDOM_LENGTH);
        assert!(parts[2].parse::<u32>().is_ok());
    }
}
