pub mod cache;
pub mod delivery;
pub mod rows;
pub mod tokens;
pub mod users;
