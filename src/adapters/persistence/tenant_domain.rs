use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::tenant_domain::{DomainStatus, SslStatus, TenantDomain},
    use_cases::tenant_domain::{SslUpdate, TenantDomainRepo},
};

const COLUMNS: &str = "id, slug, custom_domain, custom_domain_verified, custom_domain_status, \
     custom_domain_dns_record, ssl_certificate_status, ssl_certificate_expiry, \
     ssl_last_checked_at, ssl_renewal_failed, ssl_last_error, updated_at";

fn row_to_record(row: sqlx::postgres::PgRow) -> TenantDomain {
    TenantDomain {
        tenant_id: row.get("id"),
        slug: row.get("slug"),
        custom_domain: row.get("custom_domain"),
        custom_domain_verified: row.get("custom_domain_verified"),
        custom_domain_status: DomainStatus::from_str(row.get("custom_domain_status")),
        custom_domain_dns_record: row.get("custom_domain_dns_record"),
        ssl_certificate_status: SslStatus::from_str(row.get("ssl_certificate_status")),
        ssl_certificate_expiry: row.get("ssl_certificate_expiry"),
        ssl_last_checked_at: row.get("ssl_last_checked_at"),
        ssl_renewal_failed: row.get("ssl_renewal_failed"),
        ssl_last_error: row.get("ssl_last_error"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl TenantDomainRepo for PostgresPersistence {
    async fn get_by_tenant(&self, tenant_id: Uuid) -> AppResult<Option<TenantDomain>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM tenants WHERE id = $1"))
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.map(row_to_record))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> AppResult<Option<TenantDomain>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM tenants WHERE lower(custom_domain) = lower($1)"
        ))
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_record))
    }

    async fn claim_domain(
        &self,
        tenant_id: Uuid,
        domain: &str,
        verification_token: &str,
    ) -> AppResult<TenantDomain> {
        // The partial unique index on lower(custom_domain) rejects a
        // concurrent claim of the same domain by another tenant.
        let row = sqlx::query(&format!(
            r#"
                UPDATE tenants
                SET custom_domain = $2,
                    custom_domain_verified = FALSE,
                    custom_domain_status = 'pending',
                    custom_domain_dns_record = $3,
                    ssl_certificate_status = 'pending',
                    ssl_certificate_expiry = NULL,
                    ssl_last_checked_at = NULL,
                    ssl_renewal_failed = FALSE,
                    ssl_last_error = NULL,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1 AND custom_domain IS NULL
                RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(domain)
        .bind(verification_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(row_to_record(row)),
            None => match self.get_by_tenant(tenant_id).await? {
                Some(_) => Err(AppError::Conflict(
                    "A custom domain is already configured for this store".into(),
                )),
                None => Err(AppError::NotFound),
            },
        }
    }

    async fn clear_domain(&self, tenant_id: Uuid) -> AppResult<TenantDomain> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE tenants
                SET custom_domain = NULL,
                    custom_domain_verified = FALSE,
                    custom_domain_status = 'pending',
                    custom_domain_dns_record = NULL,
                    ssl_certificate_status = 'pending',
                    ssl_certificate_expiry = NULL,
                    ssl_last_checked_at = NULL,
                    ssl_renewal_failed = FALSE,
                    ssl_last_error = NULL,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(row))
    }

    async fn set_domain_status(
        &self,
        tenant_id: Uuid,
        status: DomainStatus,
        verified: bool,
    ) -> AppResult<TenantDomain> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE tenants
                SET custom_domain_status = $2,
                    custom_domain_verified = $3,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(status.as_str())
        .bind(verified)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(row))
    }

    async fn set_ssl_state(&self, tenant_id: Uuid, update: &SslUpdate) -> AppResult<TenantDomain> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE tenants
                SET ssl_certificate_status = $2,
                    ssl_certificate_expiry = $3,
                    ssl_last_checked_at = $4,
                    ssl_renewal_failed = $5,
                    ssl_last_error = $6,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                RETURNING {COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(update.status.as_str())
        .bind(update.expiry)
        .bind(update.checked_at)
        .bind(update.renewal_failed)
        .bind(update.last_error.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_record(row))
    }
}
