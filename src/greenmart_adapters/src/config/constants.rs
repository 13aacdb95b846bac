/// Process-wide cache key prefix. Every key the adapters write is
/// namespaced under it so multiple logical databases can share one backend.
pub const BASE_KEY_PREFIX: &str = "greenmart.";

pub mod env {
    pub const DATABASE_URL_ENV_VAR: &str = "GREENMART_POSTGRES__URL";
    pub const REDIS_HOST_NAME_ENV_VAR: &str = "GREENMART_REDIS__HOST_NAME";
    pub const JWT_SECRET_ENV_VAR: &str = "GREENMART_AUTH__JWT_SECRET";
}
