use std::sync::Arc;

use rand::RngCore;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::helpers::domain_parsing::{prefixed_host_label, record_host_label};
use crate::application::helpers::domain_policy::DomainPolicy;
use crate::application::ports::{AttemptLimiter, RatePolicy};
use crate::application::use_cases::dns_verification::{
    VERIFICATION_TXT_LABEL, expected_cname_target, verification_txt_host,
};
use crate::application::use_cases::tenant_domain::{
    BillingGate, TenantAccess, TenantAccessRepo, TenantDomainRepo,
};
use crate::application::validators::validate_hostname;
use crate::domain::entities::tenant_domain::TenantDomain;

/// Namespace prefix of every verification token.
pub const VERIFICATION_TOKEN_PREFIX: &str = "platform-verification=";

/// Random bytes behind each verification token.
const VERIFICATION_TOKEN_BYTES: usize = 24;

const DAY_SECS: u64 = 86_400;

/// Generate a fresh verification token: namespace prefix + hex entropy.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{VERIFICATION_TOKEN_PREFIX}{}", hex::encode(bytes))
}

pub fn attempt_key(tenant_id: Uuid) -> String {
    format!("domain:attempts:{tenant_id}")
}

pub fn daily_claim_key(tenant_id: Uuid) -> String {
    format!("domain:claims:{tenant_id}")
}

#[derive(Debug, Clone, Serialize)]
pub struct DnsRecordInstruction {
    pub record_type: &'static str,
    /// Host as typed into a DNS provider's zone editor.
    pub host: String,
    /// Fully-qualified record name.
    pub name: String,
    pub value: String,
}

/// What the tenant must publish before verification can pass.
#[derive(Debug, Clone, Serialize)]
pub struct DnsInstructions {
    pub cname: DnsRecordInstruction,
    pub txt: DnsRecordInstruction,
}

/// Limits for domain-mutation attempts.
#[derive(Debug, Clone)]
pub struct AdmissionLimits {
    pub attempts_per_window: u64,
    pub window_secs: u64,
    /// Claims per tenant per day; never reset by removal.
    pub daily_claims: u64,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            attempts_per_window: 5,
            window_secs: 3_600,
            daily_claims: 20,
        }
    }
}

/// Gatekeeper for claiming and releasing custom domains.
pub struct DomainAdmission {
    repo: Arc<dyn TenantDomainRepo>,
    access: Arc<dyn TenantAccessRepo>,
    billing: Arc<dyn BillingGate>,
    limiter: Arc<dyn AttemptLimiter>,
    policy: DomainPolicy,
    limits: AdmissionLimits,
    entitled_plans: Vec<String>,
}

impl DomainAdmission {
    pub fn new(
        repo: Arc<dyn TenantDomainRepo>,
        access: Arc<dyn TenantAccessRepo>,
        billing: Arc<dyn BillingGate>,
        limiter: Arc<dyn AttemptLimiter>,
        policy: DomainPolicy,
        limits: AdmissionLimits,
        entitled_plans: Vec<String>,
    ) -> Self {
        Self {
            repo,
            access,
            billing,
            limiter,
            policy,
            limits,
            entitled_plans: entitled_plans
                .into_iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn platform_domain(&self) -> &str {
        self.policy.platform_domain()
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    pub async fn require_owner(&self, actor_id: Uuid, tenant_id: Uuid) -> AppResult<TenantAccess> {
        let access = self.access.access(actor_id, tenant_id).await?;
        if !access.is_owner {
            return Err(AppError::Forbidden("Only the tenant owner can manage its domain".into()));
        }
        Ok(access)
    }

    pub async fn require_owner_or_admin(
        &self,
        actor_id: Uuid,
        tenant_id: Uuid,
    ) -> AppResult<TenantAccess> {
        let access = self.access.access(actor_id, tenant_id).await?;
        if !access.is_owner && !access.is_admin {
            return Err(AppError::Forbidden("Not allowed to manage this tenant".into()));
        }
        Ok(access)
    }

    pub async fn require_entitlement(&self, tenant_id: Uuid) -> AppResult<()> {
        let subscription = self.billing.subscription(tenant_id).await?;
        let entitled = subscription.is_some_and(|s| {
            s.active && self.entitled_plans.iter().any(|p| p == &s.plan.to_ascii_lowercase())
        });
        if !entitled {
            return Err(AppError::Forbidden(
                "Custom domains require an active plan that includes them".into(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Rate limiting
    // ========================================================================

    /// Count one claim/verify attempt against the tenant's hourly budget.
    pub async fn record_attempt(&self, tenant_id: Uuid) -> AppResult<()> {
        let policy = RatePolicy {
            max_attempts: self.limits.attempts_per_window,
            window_secs: self.limits.window_secs,
        };
        let decision = self.limiter.hit(&attempt_key(tenant_id), policy).await?;
        if !decision.allowed {
            warn!(tenant_id = %tenant_id, count = decision.count, "Domain attempt budget exhausted");
            return Err(AppError::RateLimited {
                reset_in_secs: decision.reset_in_secs.max(1),
            });
        }
        Ok(())
    }

    async fn record_claim(&self, tenant_id: Uuid) -> AppResult<()> {
        let policy = RatePolicy {
            max_attempts: self.limits.daily_claims,
            window_secs: DAY_SECS,
        };
        let decision = self.limiter.hit(&daily_claim_key(tenant_id), policy).await?;
        if !decision.allowed {
            warn!(tenant_id = %tenant_id, "Daily domain claim budget exhausted");
            return Err(AppError::RateLimited {
                reset_in_secs: decision.reset_in_secs.max(1),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Claim / remove
    // ========================================================================

    /// Validate and record a domain claim. Checks run in order: hostname
    /// grammar, ownership, entitlement, rate limit, denylist, uniqueness.
    #[instrument(skip(self))]
    pub async fn claim(
        &self,
        tenant_id: Uuid,
        requested_domain: &str,
        actor_id: Uuid,
    ) -> AppResult<(TenantDomain, DnsInstructions)> {
        let domain = validate_hostname(requested_domain).map_err(AppError::InvalidInput)?;

        self.require_owner(actor_id, tenant_id).await?;
        self.require_entitlement(tenant_id).await?;

        let current = self
            .repo
            .get_by_tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound)?;

        self.record_attempt(tenant_id).await?;
        self.record_claim(tenant_id).await?;

        self.policy.check(&domain).map_err(AppError::DomainRejected)?;

        if let Some(holder) = self.repo.find_by_custom_domain(&domain).await? {
            if holder.tenant_id != tenant_id {
                return Err(AppError::Conflict(
                    "This domain is already in use by another store".into(),
                ));
            }
        }
        if let Some(existing) = &current.custom_domain {
            return Err(AppError::Conflict(format!(
                "{existing} is already configured for this store; remove it first"
            )));
        }

        let token = generate_verification_token();
        let record = self.repo.claim_domain(tenant_id, &domain, &token).await?;
        let instructions = self.instructions_for(&record).ok_or_else(|| {
            AppError::Internal("claimed record is missing its domain or token".into())
        })?;

        info!(tenant_id = %tenant_id, domain = %domain, "Custom domain claimed");
        Ok((record, instructions))
    }

    /// Reset the domain fields and the tenant's hourly attempt counter.
    /// Returns the record as it was before the reset.
    #[instrument(skip(self))]
    pub async fn remove(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<(TenantDomain, TenantDomain)> {
        self.require_owner(actor_id, tenant_id).await?;

        let previous = self
            .repo
            .get_by_tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if previous.custom_domain.is_none() {
            return Err(AppError::BadRequest("No custom domain is configured".into()));
        }

        let cleared = self.repo.clear_domain(tenant_id).await?;

        if let Err(e) = self.limiter.reset(&attempt_key(tenant_id)).await {
            warn!(tenant_id = %tenant_id, error = %e, "Could not reset domain attempt counter");
        }

        info!(
            tenant_id = %tenant_id,
            domain = ?previous.custom_domain,
            "Custom domain removed"
        );
        Ok((previous, cleared))
    }

    /// DNS records the tenant must publish, if a domain is claimed.
    pub fn instructions_for(&self, record: &TenantDomain) -> Option<DnsInstructions> {
        let domain = record.custom_domain.as_deref()?;
        let token = record.custom_domain_dns_record.as_deref()?;
        let target = expected_cname_target(&record.slug, self.policy.platform_domain());

        Some(DnsInstructions {
            cname: DnsRecordInstruction {
                record_type: "CNAME",
                host: record_host_label(domain),
                name: domain.to_string(),
                value: target,
            },
            txt: DnsRecordInstruction {
                record_type: "TXT",
                host: prefixed_host_label(VERIFICATION_TXT_LABEL, domain),
                name: verification_txt_host(domain),
                value: token.to_string(),
            },
        })
    }
}
