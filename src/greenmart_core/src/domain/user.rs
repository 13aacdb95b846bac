use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::email::Email;
use crate::domain::password::Password;

/// Principal class a session belongs to. Keys every refresh-token cache
/// entry so future principal classes (e.g. admins) get their own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    User,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::User => "user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Password-free view of an account row. This is the only user shape that
/// crosses the store boundary outwards; the hash stays inside the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub email: Email,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration payload handed to the user store, which hashes the password
/// before any row is written.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub display_name: Option<String>,
    pub email: Email,
    pub password: Password,
}
