pub mod auth;
pub mod entities;
pub mod error;

pub use auth::auth_routes;
pub use entities::{entity_routes, route_segment};
pub use error::ApiError;
