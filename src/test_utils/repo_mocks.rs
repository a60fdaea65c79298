//! In-memory implementations of the tenant-domain persistence and
//! collaborator traits.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::tenant_domain::{
        BillingGate, SslUpdate, SubscriptionSnapshot, TenantAccess, TenantAccessRepo,
        TenantDomainRepo,
    },
    domain::entities::tenant_domain::{DomainStatus, SslStatus, TenantDomain},
};

/// In-memory implementation of TenantDomainRepo for testing.
#[derive(Default)]
pub struct InMemoryTenantDomainRepo {
    pub tenants: Mutex<HashMap<Uuid, TenantDomain>>,
}

impl InMemoryTenantDomainRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant: TenantDomain) {
        self.tenants.lock().unwrap().insert(tenant.tenant_id, tenant);
    }

    pub fn get(&self, tenant_id: Uuid) -> Option<TenantDomain> {
        self.tenants.lock().unwrap().get(&tenant_id).cloned()
    }

    fn update(
        &self,
        tenant_id: Uuid,
        apply: impl FnOnce(&mut TenantDomain),
    ) -> AppResult<TenantDomain> {
        let mut tenants = self.tenants.lock().unwrap();
        let tenant = tenants.get_mut(&tenant_id).ok_or(AppError::NotFound)?;
        apply(tenant);
        tenant.updated_at = Some(Utc::now());
        Ok(tenant.clone())
    }
}

#[async_trait]
impl TenantDomainRepo for InMemoryTenantDomainRepo {
    async fn get_by_tenant(&self, tenant_id: Uuid) -> AppResult<Option<TenantDomain>> {
        Ok(self.get(tenant_id))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> AppResult<Option<TenantDomain>> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .values()
            .find(|t| {
                t.custom_domain
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(domain))
            })
            .cloned())
    }

    async fn claim_domain(
        &self,
        tenant_id: Uuid,
        domain: &str,
        verification_token: &str,
    ) -> AppResult<TenantDomain> {
        let mut tenants = self.tenants.lock().unwrap();

        // Mirrors the unique index on lower(custom_domain).
        let taken = tenants.values().any(|t| {
            t.tenant_id != tenant_id
                && t.custom_domain
                    .as_deref()
                    .is_some_and(|d| d.eq_ignore_ascii_case(domain))
        });
        if taken {
            return Err(AppError::Conflict(
                "This domain is already in use by another store".into(),
            ));
        }

        let tenant = tenants.get_mut(&tenant_id).ok_or(AppError::NotFound)?;
        if tenant.custom_domain.is_some() {
            return Err(AppError::Conflict("A custom domain is already configured".into()));
        }
        tenant.custom_domain = Some(domain.to_string());
        tenant.custom_domain_dns_record = Some(verification_token.to_string());
        tenant.custom_domain_verified = false;
        tenant.custom_domain_status = DomainStatus::Pending;
        tenant.ssl_certificate_status = SslStatus::Pending;
        tenant.updated_at = Some(Utc::now());
        Ok(tenant.clone())
    }

    async fn clear_domain(&self, tenant_id: Uuid) -> AppResult<TenantDomain> {
        self.update(tenant_id, |t| {
            t.custom_domain = None;
            t.custom_domain_verified = false;
            t.custom_domain_status = DomainStatus::Pending;
            t.custom_domain_dns_record = None;
            t.ssl_certificate_status = SslStatus::Pending;
            t.ssl_certificate_expiry = None;
            t.ssl_last_checked_at = None;
            t.ssl_renewal_failed = false;
            t.ssl_last_error = None;
        })
    }

    async fn set_domain_status(
        &self,
        tenant_id: Uuid,
        status: DomainStatus,
        verified: bool,
    ) -> AppResult<TenantDomain> {
        self.update(tenant_id, |t| {
            t.custom_domain_status = status;
            t.custom_domain_verified = verified;
        })
    }

    async fn set_ssl_state(&self, tenant_id: Uuid, update: &SslUpdate) -> AppResult<TenantDomain> {
        self.update(tenant_id, |t| {
            t.ssl_certificate_status = update.status;
            t.ssl_certificate_expiry = update.expiry;
            t.ssl_last_checked_at = update.checked_at;
            t.ssl_renewal_failed = update.renewal_failed;
            t.ssl_last_error = update.last_error.clone();
        })
    }
}

/// Owners per tenant plus a set of platform admins.
#[derive(Default)]
pub struct InMemoryTenantAccessRepo {
    owners: Mutex<HashMap<Uuid, Uuid>>,
    admins: Mutex<HashSet<Uuid>>,
}

impl InMemoryTenantAccessRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, tenant_id: Uuid, owner_id: Uuid) {
        self.owners.lock().unwrap().insert(tenant_id, owner_id);
    }

    /// Register a new platform admin and return their id.
    pub fn add_admin(&self) -> Uuid {
        let admin_id = Uuid::new_v4();
        self.admins.lock().unwrap().insert(admin_id);
        admin_id
    }
}

#[async_trait]
impl TenantAccessRepo for InMemoryTenantAccessRepo {
    async fn access(&self, actor_id: Uuid, tenant_id: Uuid) -> AppResult<TenantAccess> {
        let owner = *self
            .owners
            .lock()
            .unwrap()
            .get(&tenant_id)
            .ok_or(AppError::NotFound)?;
        Ok(TenantAccess {
            is_owner: owner == actor_id,
            is_admin: self.admins.lock().unwrap().contains(&actor_id),
        })
    }
}

#[derive(Default)]
pub struct InMemoryBillingGate {
    subscriptions: Mutex<HashMap<Uuid, SubscriptionSnapshot>>,
}

impl InMemoryBillingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tenant_id: Uuid, plan: &str, active: bool) {
        self.subscriptions.lock().unwrap().insert(
            tenant_id,
            SubscriptionSnapshot {
                plan: plan.to_string(),
                active,
            },
        );
    }
}

#[async_trait]
impl BillingGate for InMemoryBillingGate {
    async fn subscription(&self, tenant_id: Uuid) -> AppResult<Option<SubscriptionSnapshot>> {
        Ok(self.subscriptions.lock().unwrap().get(&tenant_id).cloned())
    }
}
