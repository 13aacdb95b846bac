use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::email::Email;
use crate::domain::mobile::Mobile;

pub const OTP_DIGITS: usize = 6;

/// Time step of the override code generator, in seconds.
const OVERRIDE_CODE_PERIOD_SECONDS: i64 = 30;

#[derive(Debug, Error)]
pub enum OtpCodeError {
    #[error("OTP must be exactly {OTP_DIGITS} digits")]
    Malformed,
}

/// Delivery strategy an OTP was requested for. A login code and a password
/// reset code for the same identity live in separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStrategy {
    Login,
    Reset,
}

impl OtpStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpStrategy::Login => "login",
            OtpStrategy::Reset => "reset",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "login" => Some(OtpStrategy::Login),
            "reset" => Some(OtpStrategy::Reset),
            _ => None,
        }
    }
}

impl fmt::Display for OtpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity a one-time code is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpIdentity {
    Email(Email),
    Mobile(Mobile),
}

impl OtpIdentity {
    /// The key fragment the identity contributes to cache keys.
    pub fn key_fragment(&self) -> &str {
        match self {
            OtpIdentity::Email(email) => email.as_str(),
            OtpIdentity::Mobile(mobile) => mobile.as_str(),
        }
    }
}

/// Six-digit one-time code, always compared as a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Generates a fresh random code. The low bound keeps every digit
    /// position populated.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        Self(rng.random_range(111_111..=999_999u32).to_string())
    }

    pub fn parse(value: &str) -> Result<Self, OtpCodeError> {
        if value.len() == OTP_DIGITS && value.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(OtpCodeError::Malformed)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic time-stepped override code, derived from a shared secret.
/// Only constructed when explicitly configured; production configs leave it
/// out, which disables the bypass entirely.
#[derive(Clone)]
pub struct OtpOverride {
    secret: Secret<String>,
}

impl OtpOverride {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// The code valid at `at`. Stable within one 30-second step.
    pub fn current(&self, at: DateTime<Utc>) -> OtpCode {
        let step = at.timestamp() / OVERRIDE_CODE_PERIOD_SECONDS;
        let mut hasher = Sha256::new();
        hasher.update(self.secret.expose_secret().as_bytes());
        hasher.update(step.to_be_bytes());
        let digest = hasher.finalize();
        let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        OtpCode(format!("{:06}", word % 1_000_000))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), OTP_DIGITS);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn parse_rejects_non_digit_input() {
        assert!(OtpCode::parse("12345").is_err());
        assert!(OtpCode::parse("12345a").is_err());
        assert!(OtpCode::parse("1234567").is_err());
        assert!(OtpCode::parse("123456").is_ok());
    }

    #[test]
    fn override_code_is_stable_within_a_step_and_changes_across_steps() {
        let generator = OtpOverride::new(Secret::from("test-secret".to_string()));
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let same_step = base + chrono::Duration::seconds(29);
        let next_step = base + chrono::Duration::seconds(30);

        assert_eq!(generator.current(base), generator.current(same_step));
        assert_ne!(generator.current(base), generator.current(next_step));
        assert_eq!(generator.current(base).as_str().len(), OTP_DIGITS);
    }
}
