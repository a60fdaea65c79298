use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    use_cases::tenant_domain::{BillingGate, SubscriptionSnapshot},
};

/// Subscription statuses that keep paid features enabled.
const ACTIVE_STATUSES: &[&str] = &["active", "trialing"];

#[async_trait]
impl BillingGate for PostgresPersistence {
    async fn subscription(&self, tenant_id: Uuid) -> AppResult<Option<SubscriptionSnapshot>> {
        let row = sqlx::query(
            r#"
                SELECT plan, status
                FROM subscriptions
                WHERE tenant_id = $1
                ORDER BY created_at DESC
                LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(|row| {
            let status: String = row.get("status");
            SubscriptionSnapshot {
                plan: row.get("plan"),
                active: ACTIVE_STATUSES.contains(&status.as_str()),
            }
        }))
    }
}
