use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use super::InfraError;

/// Connect and bring the tenant domain columns up to date.
pub async fn init_db(database_url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    info!(max_connections, "Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(InfraError::Migration)?;
    info!("Database migrations applied");

    Ok(pool)
}
