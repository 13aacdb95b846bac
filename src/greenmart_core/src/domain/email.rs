use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address")]
    Invalid,
}

/// Validated email address. Normalized to lowercase so lookups and cache
/// keys built from it are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_lowercase();
        if EMAIL_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(EmailError::Invalid)
        }
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes_valid_addresses() {
        let email = Email::try_from("  Customer@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "customer@example.com");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "no-at-sign", "two@@example.com ok", "missing@tld"] {
            assert!(Email::try_from(bad.to_string()).is_err(), "accepted {bad:?}");
        }
    }
}
