use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;

use greenmart_adapters::cache::RedisCacheStore;
use greenmart_adapters::config::Settings;
use greenmart_adapters::delivery::{HttpEmailClient, HttpSmsClient};
use greenmart_adapters::persistence::{PostgresRowStore, PostgresUserStore};
use greenmart_adapters::tokens::JwtAccessTokens;
use greenmart_application::{CachedRepository, OtpLifecycle, RefreshTokenLifecycle};
use greenmart_core::{Email, EntityKind, OtpOverride};
use greenmart_service::state::{AuthState, EntityState};
use greenmart_service::{GreenmartService, helpers, observability};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    observability::init_tracing()?;

    let settings = Settings::load()?;

    let pool = helpers::configure_postgresql(&settings).await;
    let redis_conn = Arc::new(RwLock::new(helpers::configure_redis(&settings)));
    let cache = RedisCacheStore::new(redis_conn);

    let access_tokens = Arc::new(JwtAccessTokens::new(
        settings.auth.jwt_secret.clone(),
        settings.auth.access_token_ttl_seconds,
    ));

    let http_client = reqwest::Client::new();
    let email_client = HttpEmailClient::new(
        settings.delivery.email_base_url.clone(),
        Email::try_from(settings.delivery.email_sender.clone())
            .map_err(|e| color_eyre::eyre::eyre!("invalid sender address: {e}"))?,
        settings.delivery.email_token.clone(),
        http_client.clone(),
    );
    let sms_client = HttpSmsClient::new(
        settings.delivery.sms_base_url.clone(),
        settings.delivery.sms_api_key.clone(),
        http_client,
    );

    let mut otp = OtpLifecycle::new(cache.clone(), email_client, sms_client);
    if let Some(secret) = settings.otp.override_secret.clone() {
        otp = otp.with_override_code(OtpOverride::new(secret));
    }

    let refresh_tokens = RefreshTokenLifecycle::new(cache.clone(), (*access_tokens).clone());

    let auth_state = AuthState {
        users: Arc::new(PostgresUserStore::new(pool.clone())),
        otp: Arc::new(otp),
        refresh_tokens: Arc::new(refresh_tokens),
        access_tokens: access_tokens.clone(),
    };

    let entity_states = EntityKind::ALL
        .iter()
        .copied()
        .map(|entity| EntityState {
            repository: Arc::new(CachedRepository::new(
                entity,
                PostgresRowStore::new(pool.clone()),
                cache.clone(),
            )),
            access_tokens: access_tokens.clone(),
        })
        .collect();

    let listener = TcpListener::bind(&settings.server.address).await?;
    GreenmartService::new(auth_state, entity_states)
        .run_standalone(listener, None)
        .await?;

    Ok(())
}
