pub mod cache;
pub mod config;
pub mod delivery;
pub mod persistence;
pub mod tokens;
