use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, ExternalKind};
use crate::application::ports::CommandOutput;
use crate::application::use_cases::admission::{DnsInstructions, DomainAdmission};
use crate::application::use_cases::certificates::{
    CertificateInfo, CertificateManager, CertificateOutcome,
};
use crate::application::use_cases::dns_verification::{
    DnsVerificationEngine, VerificationResult, expected_cname_target,
};
use crate::application::use_cases::proxy_config::{
    ProxyConfigManager, SiteSpec, WrittenConfig, configured_upstream_port, render_site_config,
};
use crate::application::validators::is_valid_email;
use crate::domain::entities::tenant_domain::{DomainStatus, SslStatus, TenantDomain};

// ============================================================================
// Collaborator ports
// ============================================================================

/// Full SSL column set written in one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SslUpdate {
    pub status: SslStatus,
    pub expiry: Option<DateTime<Utc>>,
    pub checked_at: Option<DateTime<Utc>>,
    pub renewal_failed: bool,
    pub last_error: Option<String>,
}

impl SslUpdate {
    /// Current SSL state of `record`, to be modified field by field.
    pub fn from_record(record: &TenantDomain) -> Self {
        Self {
            status: record.ssl_certificate_status,
            expiry: record.ssl_certificate_expiry,
            checked_at: record.ssl_last_checked_at,
            renewal_failed: record.ssl_renewal_failed,
            last_error: record.ssl_last_error.clone(),
        }
    }

    pub fn reset() -> Self {
        Self {
            status: SslStatus::Pending,
            expiry: None,
            checked_at: None,
            renewal_failed: false,
            last_error: None,
        }
    }
}

#[async_trait]
pub trait TenantDomainRepo: Send + Sync {
    async fn get_by_tenant(&self, tenant_id: Uuid) -> AppResult<Option<TenantDomain>>;
    /// Case-insensitive lookup of the tenant currently holding `domain`.
    async fn find_by_custom_domain(&self, domain: &str) -> AppResult<Option<TenantDomain>>;
    /// Store a new claim with both statuses `pending`. Fails with `Conflict`
    /// if another tenant holds the domain.
    async fn claim_domain(
        &self,
        tenant_id: Uuid,
        domain: &str,
        verification_token: &str,
    ) -> AppResult<TenantDomain>;
    /// Reset every custom-domain column to its default.
    async fn clear_domain(&self, tenant_id: Uuid) -> AppResult<TenantDomain>;
    async fn set_domain_status(
        &self,
        tenant_id: Uuid,
        status: DomainStatus,
        verified: bool,
    ) -> AppResult<TenantDomain>;
    async fn set_ssl_state(&self, tenant_id: Uuid, update: &SslUpdate) -> AppResult<TenantDomain>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantAccess {
    pub is_owner: bool,
    pub is_admin: bool,
}

#[async_trait]
pub trait TenantAccessRepo: Send + Sync {
    /// Relation of `actor_id` to `tenant_id`. `NotFound` if the tenant does
    /// not exist.
    async fn access(&self, actor_id: Uuid, tenant_id: Uuid) -> AppResult<TenantAccess>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub plan: String,
    pub active: bool,
}

#[async_trait]
pub trait BillingGate: Send + Sync {
    async fn subscription(&self, tenant_id: Uuid) -> AppResult<Option<SubscriptionSnapshot>>;
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DomainConfig {
    #[serde(flatten)]
    pub record: TenantDomain,
    pub expected_cname: String,
    pub instructions: Option<DnsInstructions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutcome {
    pub verified: bool,
    /// True when the domain was already verified and DNS was not queried.
    pub already_verified: bool,
    pub message: String,
    pub result: Option<VerificationResult>,
    pub troubleshooting: Vec<String>,
    pub record: TenantDomain,
}

#[derive(Debug, Clone, Serialize)]
pub struct SslOutcome {
    pub record: TenantDomain,
    pub certificate: Option<CertificateInfo>,
    pub output: Option<CommandOutput>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyOutcome {
    pub record: TenantDomain,
    pub https: bool,
    pub config: Option<WrittenConfig>,
    pub reload_output: Option<CommandOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyConfigView {
    pub domain: String,
    pub path: PathBuf,
    pub content: String,
}

/// Deployment facts the state machine needs when provisioning.
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    pub upstream_host: String,
    pub default_upstream_port: u16,
    pub acme_webroot: PathBuf,
    pub default_contact_email: String,
}

// ============================================================================
// State machine
// ============================================================================

/// Orchestrates admission, verification, certificates and proxy config. The
/// only writer of the domain and SSL status columns.
#[derive(Clone)]
pub struct TenantDomainUseCases {
    repo: Arc<dyn TenantDomainRepo>,
    admission: Arc<DomainAdmission>,
    dns: Arc<DnsVerificationEngine>,
    certificates: Arc<CertificateManager>,
    proxy: Arc<ProxyConfigManager>,
    settings: ProvisioningSettings,
}

impl TenantDomainUseCases {
    pub fn new(
        repo: Arc<dyn TenantDomainRepo>,
        admission: Arc<DomainAdmission>,
        dns: Arc<DnsVerificationEngine>,
        certificates: Arc<CertificateManager>,
        proxy: Arc<ProxyConfigManager>,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            repo,
            admission,
            dns,
            certificates,
            proxy,
            settings,
        }
    }

    async fn load(&self, tenant_id: Uuid) -> AppResult<TenantDomain> {
        self.repo
            .get_by_tenant(tenant_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    fn require_domain(record: &TenantDomain) -> AppResult<String> {
        record
            .custom_domain
            .clone()
            .ok_or_else(|| AppError::BadRequest("No custom domain is configured".into()))
    }

    fn require_verified(record: &TenantDomain) -> AppResult<()> {
        let verified = record.custom_domain_verified
            && matches!(
                record.custom_domain_status,
                DomainStatus::Verified | DomainStatus::Active
            );
        if !verified {
            return Err(AppError::BadRequest(format!(
                "Domain must be verified first (current status: {})",
                record.custom_domain_status
            )));
        }
        Ok(())
    }

    /// Step the domain down from `active` before its certificate leaves
    /// `active`.
    async fn downgrade_if_active(&self, record: TenantDomain) -> AppResult<TenantDomain> {
        if record.custom_domain_status == DomainStatus::Active {
            return self
                .repo
                .set_domain_status(record.tenant_id, DomainStatus::Verified, true)
                .await;
        }
        Ok(record)
    }

    fn domain_config(&self, record: TenantDomain) -> DomainConfig {
        let instructions = self.admission.instructions_for(&record);
        DomainConfig {
            expected_cname: expected_cname_target(&record.slug, self.admission.platform_domain()),
            instructions,
            record,
        }
    }

    // ========================================================================
    // Domain
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn claim_domain(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        requested_domain: &str,
    ) -> AppResult<DomainConfig> {
        let (record, instructions) = self
            .admission
            .claim(tenant_id, requested_domain, actor_id)
            .await?;
        Ok(DomainConfig {
            expected_cname: instructions.cname.value.clone(),
            instructions: Some(instructions),
            record,
        })
    }

    /// Reset the domain record, then tear down the proxy route and the
    /// certificate. Teardown failures are logged only.
    #[instrument(skip(self))]
    pub async fn remove_domain(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<TenantDomain> {
        let (previous, cleared) = self.admission.remove(tenant_id, actor_id).await?;
        let Some(domain) = previous.custom_domain.as_deref() else {
            return Ok(cleared);
        };

        if self.proxy.exists(domain).await {
            match self.proxy.remove(domain).await {
                Ok(_) => {
                    if let Err(e) = self.proxy.reload().await {
                        warn!(domain = %domain, error = %e, "Proxy reload after domain removal failed");
                    }
                }
                Err(e) => warn!(domain = %domain, error = %e, "Could not remove proxy config"),
            }
        }

        let has_certificate = match self.certificates.get_info(domain).await {
            Ok(info) => info.exists,
            Err(e) => {
                warn!(domain = %domain, error = %e, "Could not inspect certificate during removal");
                previous.ssl_certificate_status != SslStatus::Pending
            }
        };
        if has_certificate && let Err(e) = self.certificates.revoke(domain).await {
            warn!(domain = %domain, error = %e, "Could not revoke certificate during removal");
        }

        Ok(cleared)
    }

    #[instrument(skip(self))]
    pub async fn get_domain_config(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<DomainConfig> {
        self.admission.require_owner_or_admin(actor_id, tenant_id).await?;
        let record = self.load(tenant_id).await?;
        Ok(self.domain_config(record))
    }

    /// Check the tenant's DNS and move the domain to `verified` or `failed`.
    ///
    /// A DNS mismatch is a normal outcome (`verified = false`). `Err` is only
    /// returned when the check itself could not run, and then the status is
    /// put back to `pending`.
    #[instrument(skip(self))]
    pub async fn verify_domain(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<VerifyOutcome> {
        self.admission.require_owner(actor_id, tenant_id).await?;
        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;

        if record.custom_domain_verified
            && matches!(
                record.custom_domain_status,
                DomainStatus::Verified | DomainStatus::Active
            )
        {
            return Ok(VerifyOutcome {
                verified: true,
                already_verified: true,
                message: "Domain is already verified".to_string(),
                result: None,
                troubleshooting: Vec::new(),
                record,
            });
        }

        let token = record
            .custom_domain_dns_record
            .clone()
            .ok_or_else(|| AppError::Internal("claimed domain has no verification token".into()))?;

        self.admission.record_attempt(tenant_id).await?;

        self.repo
            .set_domain_status(tenant_id, DomainStatus::Verifying, false)
            .await?;

        let result = match self.dns.verify(&domain, &record.slug, &token).await {
            Ok(result) => result,
            Err(e) => {
                error!(tenant_id = %tenant_id, domain = %domain, error = %e, "DNS verification could not run");
                if let Err(revert) = self
                    .repo
                    .set_domain_status(tenant_id, DomainStatus::Pending, false)
                    .await
                {
                    error!(tenant_id = %tenant_id, error = %revert, "Failed to revert domain status");
                }
                return Err(e);
            }
        };

        if result.overall_valid {
            let record = self
                .repo
                .set_domain_status(tenant_id, DomainStatus::Verified, true)
                .await?;
            info!(tenant_id = %tenant_id, domain = %domain, "Custom domain verified");
            return Ok(VerifyOutcome {
                verified: true,
                already_verified: false,
                message: result.message.clone(),
                result: Some(result),
                troubleshooting: Vec::new(),
                record,
            });
        }

        let record = self
            .repo
            .set_domain_status(tenant_id, DomainStatus::Failed, false)
            .await?;
        info!(tenant_id = %tenant_id, domain = %domain, reason = %result.message, "Custom domain verification failed");
        Ok(VerifyOutcome {
            verified: false,
            already_verified: false,
            message: result.message.clone(),
            troubleshooting: troubleshooting_steps(&result, &token),
            result: Some(result),
            record,
        })
    }

    // ========================================================================
    // SSL
    // ========================================================================

    #[instrument(skip(self))]
    pub async fn request_ssl(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        contact_email: Option<&str>,
    ) -> AppResult<SslOutcome> {
        self.admission.require_owner(actor_id, tenant_id).await?;

        let email = match contact_email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) if is_valid_email(email) => email.to_string(),
            Some(_) => return Err(AppError::InvalidInput("Invalid contact email".into())),
            None => self.settings.default_contact_email.clone(),
        };

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        Self::require_verified(&record)?;
        if record.ssl_certificate_status == SslStatus::Active {
            return Err(AppError::BadRequest(
                "Certificate is already active; renew it instead".into(),
            ));
        }

        let before = SslUpdate::from_record(&record);
        self.repo
            .set_ssl_state(tenant_id, &SslUpdate {
                status: SslStatus::Requesting,
                ..before.clone()
            })
            .await?;

        let outcome = match self.certificates.request(&domain, &email).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(tenant_id = %tenant_id, domain = %domain, error = %e, "Certificate request could not run");
                if let Err(revert) = self.repo.set_ssl_state(tenant_id, &before).await {
                    error!(tenant_id = %tenant_id, error = %revert, "Failed to revert SSL status");
                }
                return Err(e);
            }
        };

        match outcome {
            CertificateOutcome::Succeeded { info, output, .. } => {
                self.repo
                    .set_ssl_state(tenant_id, &SslUpdate {
                        status: SslStatus::Active,
                        expiry: info.expires_at,
                        checked_at: Some(Utc::now()),
                        renewal_failed: false,
                        last_error: None,
                    })
                    .await?;
                let record = self
                    .repo
                    .set_domain_status(tenant_id, DomainStatus::Active, true)
                    .await?;
                info!(tenant_id = %tenant_id, domain = %domain, "Certificate active");
                Ok(SslOutcome {
                    record,
                    certificate: Some(info),
                    output: Some(output),
                    message: "Certificate issued".to_string(),
                })
            }
            CertificateOutcome::Failed { reason, output } => {
                self.repo
                    .set_ssl_state(tenant_id, &SslUpdate {
                        status: SslStatus::Failed,
                        expiry: None,
                        checked_at: Some(Utc::now()),
                        renewal_failed: false,
                        last_error: Some(reason.clone()),
                    })
                    .await?;
                Err(AppError::external_with_output(
                    ExternalKind::CertificateClient,
                    reason,
                    output,
                ))
            }
        }
    }

    /// Renew the certificate. A failed renewal on a certificate that is still
    /// valid keeps `active` and raises `ssl_renewal_failed`.
    #[instrument(skip(self))]
    pub async fn renew_ssl(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<SslOutcome> {
        self.admission.require_owner(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        Self::require_verified(&record)?;
        if !matches!(
            record.ssl_certificate_status,
            SslStatus::Active | SslStatus::Expired
        ) {
            return Err(AppError::BadRequest(
                "No certificate to renew; request one first".into(),
            ));
        }

        match self.certificates.renew(&domain).await? {
            CertificateOutcome::Succeeded {
                info,
                output,
                renewed,
            } => {
                let record = self
                    .repo
                    .set_ssl_state(tenant_id, &SslUpdate {
                        status: SslStatus::Active,
                        expiry: info.expires_at,
                        checked_at: Some(Utc::now()),
                        renewal_failed: false,
                        last_error: None,
                    })
                    .await?;
                let message = if renewed {
                    "Certificate renewed"
                } else {
                    "Certificate is not yet due for renewal"
                };
                Ok(SslOutcome {
                    record,
                    certificate: Some(info),
                    output: Some(output),
                    message: message.to_string(),
                })
            }
            CertificateOutcome::Failed { reason, output } => {
                let still_valid = match self.certificates.get_info(&domain).await {
                    Ok(info) => info.valid,
                    Err(e) => {
                        warn!(domain = %domain, error = %e, "Could not inspect certificate after failed renewal");
                        false
                    }
                };

                if still_valid && record.ssl_certificate_status == SslStatus::Active {
                    self.repo
                        .set_ssl_state(tenant_id, &SslUpdate {
                            renewal_failed: true,
                            last_error: Some(reason.clone()),
                            checked_at: Some(Utc::now()),
                            ..SslUpdate::from_record(&record)
                        })
                        .await?;
                    warn!(domain = %domain, "Renewal failed; current certificate still valid");
                } else {
                    let record = self.downgrade_if_active(record).await?;
                    self.repo
                        .set_ssl_state(tenant_id, &SslUpdate {
                            status: SslStatus::Failed,
                            checked_at: Some(Utc::now()),
                            renewal_failed: true,
                            last_error: Some(reason.clone()),
                            ..SslUpdate::from_record(&record)
                        })
                        .await?;
                }

                Err(AppError::external_with_output(
                    ExternalKind::CertificateClient,
                    reason,
                    output,
                ))
            }
        }
    }

    /// Revoke and delete the certificate. The SSL status is reset to `pending`
    /// whatever the client reports; an existing proxy config falls back to
    /// plain HTTP.
    #[instrument(skip(self))]
    pub async fn revoke_ssl(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<SslOutcome> {
        self.admission.require_owner(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        let on_disk = match self.certificates.get_info(&domain).await {
            Ok(info) => info.exists,
            Err(e) => {
                warn!(domain = %domain, error = %e, "Could not inspect certificate before revoke");
                true
            }
        };
        if record.ssl_certificate_status == SslStatus::Pending && !on_disk {
            return Err(AppError::BadRequest("No certificate to revoke".into()));
        }

        self.downgrade_if_active(record).await?;

        let output = match self.certificates.revoke(&domain).await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!(domain = %domain, error = %e, "Certificate revoke did not complete");
                None
            }
        };

        let record = self.repo.set_ssl_state(tenant_id, &SslUpdate::reset()).await?;

        if let Ok(Some(current)) = self.proxy.read(&domain).await {
            let port = configured_upstream_port(&current)
                .unwrap_or(self.settings.default_upstream_port);
            let text = self.render(&record, &domain, port, false);
            match self.proxy.write(&domain, &text).await {
                Ok(_) => {
                    if let Err(e) = self.proxy.reload().await {
                        warn!(domain = %domain, error = %e, "Proxy reload after revoke failed");
                    }
                }
                Err(e) => warn!(domain = %domain, error = %e, "Could not rewrite proxy config without TLS"),
            }
        }

        info!(tenant_id = %tenant_id, domain = %domain, "Certificate revoked");
        Ok(SslOutcome {
            record,
            certificate: None,
            output,
            message: "Certificate revoked".to_string(),
        })
    }

    /// Refresh SSL state from the certificate on disk. An `active` record
    /// whose certificate has run out becomes `expired`.
    #[instrument(skip(self))]
    pub async fn ssl_status(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<SslOutcome> {
        self.admission.require_owner_or_admin(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let Some(domain) = record.custom_domain.clone() else {
            return Ok(SslOutcome {
                record,
                certificate: None,
                output: None,
                message: "No custom domain is configured".to_string(),
            });
        };

        let info = self.certificates.get_info(&domain).await?;
        let now = Utc::now();
        let status = record.ssl_certificate_status;

        let (record, message) = if status == SslStatus::Active && info.is_expired() {
            let record = self.downgrade_if_active(record).await?;
            let record = self
                .repo
                .set_ssl_state(tenant_id, &SslUpdate {
                    status: SslStatus::Expired,
                    expiry: info.expires_at,
                    checked_at: Some(now),
                    ..SslUpdate::from_record(&record)
                })
                .await?;
            warn!(domain = %domain, "Certificate expired");
            (record, "Certificate has expired".to_string())
        } else if status == SslStatus::Active && !info.exists {
            let record = self.downgrade_if_active(record).await?;
            let record = self
                .repo
                .set_ssl_state(tenant_id, &SslUpdate {
                    status: SslStatus::Failed,
                    expiry: None,
                    checked_at: Some(now),
                    last_error: Some("Certificate files are missing".to_string()),
                    ..SslUpdate::from_record(&record)
                })
                .await?;
            warn!(domain = %domain, "Active certificate missing from disk");
            (record, "Certificate files are missing".to_string())
        } else {
            let expiry = if info.exists {
                info.expires_at
            } else {
                record.ssl_certificate_expiry
            };
            let record = self
                .repo
                .set_ssl_state(tenant_id, &SslUpdate {
                    expiry,
                    checked_at: Some(now),
                    ..SslUpdate::from_record(&record)
                })
                .await?;
            let message = match info.days_until_expiry {
                Some(days) if info.exists => format!("Certificate valid for {days} more days"),
                _ => format!("Certificate status: {}", record.ssl_certificate_status),
            };
            (record, message)
        };

        Ok(SslOutcome {
            record,
            certificate: Some(info),
            output: None,
            message,
        })
    }

    // ========================================================================
    // Proxy config
    // ========================================================================

    fn render(&self, record: &TenantDomain, domain: &str, upstream_port: u16, https: bool) -> String {
        let cert_paths = https.then(|| self.certificates.paths(domain));
        let site = SiteSpec {
            domain,
            tenant_slug: &record.slug,
            upstream_host: &self.settings.upstream_host,
            upstream_port,
            acme_webroot: &self.settings.acme_webroot,
            cert_paths: cert_paths.as_ref(),
        };
        render_site_config(&site, Utc::now())
    }

    async fn publish(
        &self,
        record: TenantDomain,
        domain: &str,
        upstream_port: u16,
        https: bool,
    ) -> AppResult<ProxyOutcome> {
        let text = self.render(&record, domain, upstream_port, https);
        let written = self.proxy.write(domain, &text).await?;
        let reload_output = self.proxy.reload().await?;

        let record = if https {
            self.repo
                .set_domain_status(record.tenant_id, DomainStatus::Active, true)
                .await?
        } else {
            record
        };

        info!(domain = %domain, https, "Proxy config live");
        Ok(ProxyOutcome {
            record,
            https,
            config: Some(written),
            reload_output: Some(reload_output),
        })
    }

    /// Create the site config. With an active certificate the HTTPS variant is
    /// rendered and the domain goes `active`.
    #[instrument(skip(self))]
    pub async fn create_proxy_config(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        upstream_port: Option<u16>,
    ) -> AppResult<ProxyOutcome> {
        self.admission.require_owner_or_admin(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        Self::require_verified(&record)?;
        if self.proxy.exists(&domain).await {
            return Err(AppError::Conflict(
                "Proxy config already exists; update it instead".into(),
            ));
        }

        let https = record.ssl_certificate_status == SslStatus::Active;
        let port = upstream_port.unwrap_or(self.settings.default_upstream_port);
        self.publish(record, &domain, port, https).await
    }

    /// Rewrite an existing site config with TLS enabled.
    #[instrument(skip(self))]
    pub async fn update_proxy_config(
        &self,
        tenant_id: Uuid,
        actor_id: Uuid,
        upstream_port: Option<u16>,
    ) -> AppResult<ProxyOutcome> {
        self.admission.require_owner_or_admin(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        let current = self.proxy.read(&domain).await?.ok_or(AppError::NotFound)?;
        if record.ssl_certificate_status != SslStatus::Active {
            return Err(AppError::BadRequest(
                "An active certificate is required to enable HTTPS".into(),
            ));
        }

        let port = upstream_port
            .or_else(|| configured_upstream_port(&current))
            .unwrap_or(self.settings.default_upstream_port);
        self.publish(record, &domain, port, true).await
    }

    #[instrument(skip(self))]
    pub async fn remove_proxy_config(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<ProxyOutcome> {
        self.admission.require_owner_or_admin(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        if !self.proxy.exists(&domain).await {
            return Err(AppError::NotFound);
        }

        let record = self.downgrade_if_active(record).await?;
        self.proxy.remove(&domain).await?;
        let reload_output = self.proxy.reload().await?;

        info!(domain = %domain, "Proxy config removed");
        Ok(ProxyOutcome {
            record,
            https: false,
            config: None,
            reload_output: Some(reload_output),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_proxy_config(&self, tenant_id: Uuid, actor_id: Uuid) -> AppResult<ProxyConfigView> {
        self.admission.require_owner_or_admin(actor_id, tenant_id).await?;

        let record = self.load(tenant_id).await?;
        let domain = Self::require_domain(&record)?;
        let content = self.proxy.read(&domain).await?.ok_or(AppError::NotFound)?;

        Ok(ProxyConfigView {
            path: self.proxy.available_path(&domain),
            domain,
            content,
        })
    }
}

/// Concrete steps a tenant can take to fix a failed verification.
fn troubleshooting_steps(result: &VerificationResult, token: &str) -> Vec<String> {
    let mut steps = Vec::new();
    if !result.cname_valid {
        steps.push(format!(
            "Create a CNAME record for {} pointing to {}",
            result.domain, result.expected_cname
        ));
    }
    if !result.txt_valid {
        steps.push(format!(
            "Create a TXT record at {} with the value {token}",
            result.txt_host
        ));
    }
    steps.push(
        "DNS changes can take up to 48 hours to propagate; wait a few minutes and verify again"
            .to_string(),
    );
    steps
}
