use thiserror::Error;

use crate::domain::fingerprint::FingerprintHash;

#[derive(Debug, Error)]
pub enum AccessTokenError {
    #[error("Failed to issue access token: {0}")]
    Issue(String),
    #[error("Invalid access token")]
    Invalid,
}

/// Short-lived access-token issuer, treated as opaque. `generate` binds the
/// token to the presenting client's fingerprint; `verify` enforces that
/// binding and yields the subject id.
pub trait AccessTokens: Send + Sync {
    fn generate(&self, user_id: i64, user_agent: &str) -> Result<String, AccessTokenError>;

    fn verify(&self, token: &str, user_agent: &str) -> Result<i64, AccessTokenError>;

    fn hash_fingerprint(&self, user_agent: &str) -> FingerprintHash;
}
