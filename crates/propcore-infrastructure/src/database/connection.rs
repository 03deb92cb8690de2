//! Database connection pool

use propcore_shared::config::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Builds the pool with the acquire and statement timeouts every store call
/// runs under. A timed-out call surfaces to the core as a transient error.
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let statement_timeout = settings.statement_timeout_ms;
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = {statement_timeout}"))
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&settings.url)
        .await
}
