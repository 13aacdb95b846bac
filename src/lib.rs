//! # Greenmart - E-commerce Backend Core
//!
//! Facade crate re-exporting the public APIs of the Greenmart components:
//! the read-through cached repository over the relational store and the
//! OTP / refresh-token authentication lifecycles, plus the adapters and
//! the HTTP service wiring them together.
//!
//! ## Structure
//!
//! - **Core domain types**: `Email`, `Password`, `OtpCode`, `EntityKind`, etc.
//! - **Port traits**: `CacheStore`, `RowStore`, `UserStore`, `AccessTokens`
//! - **Lifecycles & use cases**: `CachedRepository`, `OtpLifecycle`,
//!   `RefreshTokenLifecycle`, `LoginUseCase`, `RegisterUseCase`, etc.
//! - **Adapters**: `RedisCacheStore`, `PostgresRowStore`,
//!   `PostgresUserStore`, `JwtAccessTokens`, `HttpEmailClient`, etc.
//! - **Service**: `GreenmartService` - the assembled HTTP surface

// ============================================================================
// Core Domain Types
// ============================================================================

/// Core domain types and value objects
pub mod core {
    pub use greenmart_core::*;
}

// Re-export most commonly used core types at the root level
pub use greenmart_core::{
    Email, EntityKind, FingerprintHash, ListFilter, Mobile, NewUser, OtpCode, OtpIdentity,
    OtpOverride, OtpStrategy, Password, Patch, Record, UserProfile, UserType,
};

// ============================================================================
// Port Traits
// ============================================================================

/// Port trait definitions
pub mod ports {
    pub use greenmart_core::ports::*;
}

// Re-export port traits at root level
pub use greenmart_core::{
    AccessTokens, CacheStore, CacheStoreError, EmailClient, RowStore, RowStoreError, SmsClient,
    UserStore, UserStoreError,
};

// ============================================================================
// Lifecycles & Use Cases (Application Layer)
// ============================================================================

/// Application lifecycles and use cases
pub mod application {
    pub use greenmart_application::*;
}

// Re-export the lifecycles and use cases at root level
pub use greenmart_application::{
    CachedRepository, LoginUseCase, LogoutUseCase, OtpLifecycle, RefreshTokenLifecycle,
    RegisterUseCase, RepositoryError, RequestOtpUseCase, ResetPasswordUseCase, VerifyOtpUseCase,
};

// ============================================================================
// Adapters (Infrastructure)
// ============================================================================

/// Infrastructure adapters
pub mod adapters {
    /// Cache store implementations
    pub mod cache {
        pub use greenmart_adapters::cache::*;
    }

    /// Persistence implementations
    pub mod persistence {
        pub use greenmart_adapters::persistence::*;
    }

    /// Delivery client implementations
    pub mod delivery {
        pub use greenmart_adapters::delivery::*;
    }

    /// Access token issuing
    pub mod tokens {
        pub use greenmart_adapters::tokens::*;
    }

    /// Configuration
    pub mod config {
        pub use greenmart_adapters::config::*;
    }
}

// Re-export commonly used adapters at root level
pub use greenmart_adapters::{
    cache::{InMemoryCacheStore, RedisCacheStore},
    delivery::{HttpEmailClient, HttpSmsClient, MockEmailClient, MockSmsClient},
    persistence::{InMemoryRowStore, InMemoryUserStore, PostgresRowStore, PostgresUserStore},
    tokens::JwtAccessTokens,
};

// ============================================================================
// Service (Main Entry Point)
// ============================================================================

/// Main HTTP service
pub use greenmart_service::{
    GreenmartService,
    helpers::{configure_postgresql, configure_redis, get_redis_client},
};

// ============================================================================
// Re-export common external dependencies
// ============================================================================

/// Re-export async-trait for implementing port traits
pub use async_trait::async_trait;

/// Re-export secrecy for working with secrets
pub use secrecy::{ExposeSecret, Secret};

pub use http;
