use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use greenmart_core::{AccessTokenError, AccessTokens, FingerprintHash};

/// Default lifetime of a short-lived access token, in seconds.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    user_id: i64,
    fingerprint: String,
    iat: i64,
    exp: i64,
}

/// HS256 access tokens with the client fingerprint baked into the claims,
/// so a token replayed from another device fails verification even before
/// it expires.
#[derive(Clone)]
pub struct JwtAccessTokens {
    secret: Secret<String>,
    ttl_seconds: i64,
}

impl JwtAccessTokens {
    pub fn new(secret: Secret<String>, ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
        }
    }
}

impl AccessTokens for JwtAccessTokens {
    fn generate(&self, user_id: i64, user_agent: &str) -> Result<String, AccessTokenError> {
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            user_id,
            fingerprint: self.hash_fingerprint(user_agent).as_str().to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AccessTokenError::Issue(e.to_string()))
    }

    fn verify(&self, token: &str, user_agent: &str) -> Result<i64, AccessTokenError> {
        let data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AccessTokenError::Invalid)?;

        if data.claims.fingerprint != self.hash_fingerprint(user_agent).as_str() {
            return Err(AccessTokenError::Invalid);
        }
        Ok(data.claims.user_id)
    }

    fn hash_fingerprint(&self, user_agent: &str) -> FingerprintHash {
        let mut hasher = Sha256::new();
        hasher.update(user_agent.as_bytes());
        FingerprintHash::new(hex::encode(hasher.finalize()))
    }
}
