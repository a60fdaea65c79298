use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a tenant's custom hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Pending,
    Verifying,
    Verified,
    Failed,
    Active,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Pending => "pending",
            DomainStatus::Verifying => "verifying",
            DomainStatus::Verified => "verified",
            DomainStatus::Failed => "failed",
            DomainStatus::Active => "active",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => DomainStatus::Pending,
            "verifying" => DomainStatus::Verifying,
            "verified" => DomainStatus::Verified,
            "failed" => DomainStatus::Failed,
            "active" => DomainStatus::Active,
            _ => DomainStatus::Pending,
        }
    }

    /// Statuses that only exist while an external call is in flight.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainStatus::Verifying)
    }
}

impl Default for DomainStatus {
    fn default() -> Self {
        DomainStatus::Pending
    }
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of the TLS certificate attached to a custom hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslStatus {
    Pending,
    Requesting,
    Active,
    Failed,
    Expired,
}

impl SslStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslStatus::Pending => "pending",
            SslStatus::Requesting => "requesting",
            SslStatus::Active => "active",
            SslStatus::Failed => "failed",
            SslStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => SslStatus::Pending,
            "requesting" => SslStatus::Requesting,
            "active" => SslStatus::Active,
            "failed" => SslStatus::Failed,
            "expired" => SslStatus::Expired,
            _ => SslStatus::Pending,
        }
    }

    /// `requesting` only lasts while the certificate client runs.
    pub fn is_transient(&self) -> bool {
        matches!(self, SslStatus::Requesting)
    }
}

impl Default for SslStatus {
    fn default() -> Self {
        SslStatus::Pending
    }
}

impl std::fmt::Display for SslStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The custom-domain slice of a tenant record.
///
/// Only the domain state machine writes these fields; everything else on the
/// tenant entity belongs to other subsystems.
#[derive(Debug, Clone, Serialize)]
pub struct TenantDomain {
    pub tenant_id: Uuid,
    pub slug: String,
    pub custom_domain: Option<String>,
    pub custom_domain_verified: bool,
    pub custom_domain_status: DomainStatus,
    pub custom_domain_dns_record: Option<String>,
    pub ssl_certificate_status: SslStatus,
    pub ssl_certificate_expiry: Option<DateTime<Utc>>,
    pub ssl_last_checked_at: Option<DateTime<Utc>>,
    /// Set when the last renewal attempt failed while the certificate on disk
    /// was still valid.
    pub ssl_renewal_failed: bool,
    pub ssl_last_error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TenantDomain {
    /// Checks the cross-field invariants of the record. Returns the first
    /// violated rule.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.custom_domain.is_none()
            && (self.custom_domain_status != DomainStatus::Pending
                || self.ssl_certificate_status != SslStatus::Pending
                || self.custom_domain_dns_record.is_some())
        {
            return Some("record without a domain must be fully reset");
        }
        if self.ssl_certificate_status == SslStatus::Active && !self.custom_domain_verified {
            return Some("active certificate on an unverified domain");
        }
        if self.custom_domain_status == DomainStatus::Active
            && self.ssl_certificate_status != SslStatus::Active
        {
            return Some("active domain without an active certificate");
        }
        None
    }
}
