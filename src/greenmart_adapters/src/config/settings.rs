use secrecy::Secret;
use serde::Deserialize;

/// Service configuration, loaded from an optional `configuration` file and
/// `GREENMART_`-prefixed environment variables (environment wins).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub postgres: PostgresSettings,
    pub redis: RedisSettings,
    pub auth: AuthSettings,
    pub otp: OtpSettings,
    pub delivery: DeliverySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    pub url: Secret<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub host_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: Secret<String>,
    pub access_token_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpSettings {
    /// Shared secret for the deterministic override code. Absent in
    /// production configurations, which disables the override path.
    pub override_secret: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliverySettings {
    pub email_base_url: String,
    pub email_sender: String,
    pub email_token: Secret<String>,
    pub sms_base_url: String,
    pub sms_api_key: Secret<String>,
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .set_default("server.address", "0.0.0.0:3000")?
            .set_default("postgres.max_connections", 5)?
            .set_default("auth.access_token_ttl_seconds", 15 * 60)?
            .set_default("delivery.email_base_url", "https://api.postmarkapp.com/")?
            .set_default("delivery.email_sender", "no-reply@greenmart.example")?
            .set_default("delivery.sms_base_url", "https://sms.gateway.example/")?
            .add_source(config::File::with_name("configuration").required(false))
            .add_source(
                config::Environment::with_prefix("GREENMART")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
