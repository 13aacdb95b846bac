use redis::{Client, RedisResult};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use greenmart_adapters::config::Settings;

/// Configure and return a PostgreSQL connection pool.
///
/// Creates the pool from the configured URL and runs all pending
/// migrations.
///
/// # Panics
/// Panics if unable to create the pool or run migrations.
pub async fn configure_postgresql(settings: &Settings) -> PgPool {
    let pg_pool = get_postgres_pool(
        settings.postgres.url.expose_secret(),
        settings.postgres.max_connections,
    )
    .await
    .expect("Failed to create Postgres connection pool");

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .expect("Failed to run migrations");

    pg_pool
}

/// Configure and return a Redis connection.
///
/// # Panics
/// Panics if unable to connect to Redis.
pub fn configure_redis(settings: &Settings) -> redis::Connection {
    get_redis_client(&settings.redis.host_name)
        .expect("Failed to get Redis client")
        .get_connection()
        .expect("Failed to get Redis connection")
}

pub async fn get_postgres_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

pub fn get_redis_client(redis_hostname: &str) -> RedisResult<Client> {
    let redis_url = format!("redis://{}/", redis_hostname);
    redis::Client::open(redis_url)
}
