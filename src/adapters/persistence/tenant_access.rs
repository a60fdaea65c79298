use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    use_cases::tenant_domain::{TenantAccess, TenantAccessRepo},
};

#[async_trait]
impl TenantAccessRepo for PostgresPersistence {
    async fn access(&self, actor_id: Uuid, tenant_id: Uuid) -> AppResult<TenantAccess> {
        let row = sqlx::query(
            r#"
                SELECT
                    t.owner_user_id = $1 AS is_owner,
                    COALESCE((SELECT u.is_admin FROM users u WHERE u.id = $1), FALSE) AS is_admin
                FROM tenants t
                WHERE t.id = $2
            "#,
        )
        .bind(actor_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        Ok(TenantAccess {
            is_owner: row.get::<Option<bool>, _>("is_owner").unwrap_or(false),
            is_admin: row.get("is_admin"),
        })
    }
}
