pub mod jwt_access_tokens;

pub use jwt_access_tokens::{DEFAULT_ACCESS_TOKEN_TTL_SECONDS, JwtAccessTokens};
