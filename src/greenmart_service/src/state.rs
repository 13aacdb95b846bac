use std::sync::Arc;

use greenmart_adapters::cache::RedisCacheStore;
use greenmart_adapters::delivery::{HttpEmailClient, HttpSmsClient};
use greenmart_adapters::persistence::{PostgresRowStore, PostgresUserStore};
use greenmart_adapters::tokens::JwtAccessTokens;
use greenmart_application::{CachedRepository, OtpLifecycle, RefreshTokenLifecycle};

pub type EntityRepository = CachedRepository<PostgresRowStore, RedisCacheStore>;
pub type Otp = OtpLifecycle<RedisCacheStore, HttpEmailClient, HttpSmsClient>;
pub type RefreshTokens = RefreshTokenLifecycle<RedisCacheStore, JwtAccessTokens>;

/// State shared by the auth routes.
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<PostgresUserStore>,
    pub otp: Arc<Otp>,
    pub refresh_tokens: Arc<RefreshTokens>,
    pub access_tokens: Arc<JwtAccessTokens>,
}

/// State for one entity's CRUD routes.
#[derive(Clone)]
pub struct EntityState {
    pub repository: Arc<EntityRepository>,
    pub access_tokens: Arc<JwtAccessTokens>,
}
