use thiserror::Error;

/// Startup failures. Display text never includes connection strings or
/// secrets; the `#[source]` chain may, so log these with `%e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Database migration failed")]
    Migration(#[source] sqlx::migrate::MigrateError),

    #[error("Redis connection failed. Check REDIS_URL and credentials.")]
    RedisConnection(#[source] redis::RedisError),

    #[error("Configuration error: environment variable {var} not set")]
    ConfigMissing { var: &'static str },

    #[error("Configuration error: {var} has an invalid value")]
    ConfigInvalid { var: &'static str },

    #[error("DNS resolver initialization failed. Check /etc/resolv.conf or set DNS_SERVER.")]
    Resolver(#[source] hickory_resolver::ResolveError),

    #[error("Could not bind the HTTP listener")]
    TcpBind(#[source] std::io::Error),

    #[error("HTTP server stopped with an error")]
    Server(#[source] std::io::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}
