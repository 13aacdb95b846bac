use serde::{Deserialize, Serialize};

/// Hash of client-identifying request metadata (user-agent), binding a
/// refresh token lineage to the device that opened it. Only the hash ever
/// leaves the token issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintHash(String);

impl FingerprintHash {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
