use sqlx::PgPool;

use crate::app_error::AppError;

pub mod billing;
pub mod tenant_access;
pub mod tenant_domain;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                // PostgreSQL unique violation: only custom_domain is unique here
                if db_err.is_unique_violation() {
                    AppError::Conflict("This domain is already in use by another store".into())
                } else if db_err.is_foreign_key_violation() {
                    AppError::InvalidInput("Referenced record not found".into())
                } else if db_err.is_check_violation() {
                    // tenants_* CHECK constraints mirror the state-machine invariants
                    tracing::error!(
                        constraint = ?db_err.constraint(),
                        "Domain state invariant rejected by database"
                    );
                    AppError::Internal("Domain state update violated an invariant".into())
                } else {
                    // Log the actual error for debugging, but don't expose details
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
