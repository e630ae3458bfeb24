use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

/// Open the signup database.
///
/// Hosted serverless Postgres closes idle connections aggressively, so the pool
/// keeps no warm connections and recycles them quickly.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .application_name(env!("CARGO_PKG_NAME"));

    tracing::info!("Connecting to signup database...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(900))
        .connect_with(options)
        .await?;

    tracing::info!("Signup database connected");

    Ok(pool)
}
