pub mod constants;
pub mod settings;

pub use constants::*;
pub use settings::{
    AuthSettings, DeliverySettings, OtpSettings, PostgresSettings, RedisSettings, ServerSettings,
    Settings,
};
