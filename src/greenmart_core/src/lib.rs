pub mod domain;
pub mod keys;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    email::{Email, EmailError},
    entity::{
        DEFAULT_LIST_LIMIT, DEFAULT_LIST_SKIP, EntityKind, ListFilter, Patch, Record,
    },
    fingerprint::FingerprintHash,
    mobile::{Mobile, MobileError},
    otp::{OtpCode, OtpCodeError, OtpIdentity, OtpOverride, OtpStrategy},
    password::{Password, PasswordError},
    user::{NewUser, UserProfile, UserType},
};

pub use ports::{
    cache::{CacheStore, CacheStoreError, SCAN_PAGE_SIZE},
    delivery::{EmailClient, SmsClient},
    rows::{RowPredicate, RowSearch, RowSelect, RowStore, RowStoreError},
    tokens::{AccessTokenError, AccessTokens},
    users::{UserStore, UserStoreError},
};
