//! Test data factories. Use the closure parameter to override fields.

use std::path::Path;

use uuid::Uuid;

use crate::domain::entities::tenant_domain::{DomainStatus, SslStatus, TenantDomain};

/// Create a tenant with no custom domain and everything at its reset state.
pub fn create_test_tenant(overrides: impl FnOnce(&mut TenantDomain)) -> TenantDomain {
    let mut tenant = TenantDomain {
        tenant_id: Uuid::new_v4(),
        slug: "mytenant".to_string(),
        custom_domain: None,
        custom_domain_verified: false,
        custom_domain_status: DomainStatus::Pending,
        custom_domain_dns_record: None,
        ssl_certificate_status: SslStatus::Pending,
        ssl_certificate_expiry: None,
        ssl_last_checked_at: None,
        ssl_renewal_failed: false,
        ssl_last_error: None,
        updated_at: None,
    };
    overrides(&mut tenant);
    tenant
}

/// Mint a self-signed certificate for `domain` expiring on January 1st of
/// `not_after_year` and lay it out as `{dir}/{domain}/*.pem`.
pub fn write_test_certificate(dir: &Path, domain: &str, not_after_year: i32) {
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let mut params = rcgen::CertificateParams::new(vec![domain.to_string()]).unwrap();
    params.not_before = rcgen::date_time_ymd(2000, 1, 1);
    params.not_after = rcgen::date_time_ymd(not_after_year, 1, 1);
    let cert = params.self_signed(&key_pair).unwrap();

    let domain_dir = dir.join(domain);
    std::fs::create_dir_all(&domain_dir).unwrap();
    let cert_pem = cert.pem();
    std::fs::write(domain_dir.join("cert.pem"), &cert_pem).unwrap();
    std::fs::write(domain_dir.join("fullchain.pem"), &cert_pem).unwrap();
    std::fs::write(domain_dir.join("chain.pem"), &cert_pem).unwrap();
    std::fs::write(domain_dir.join("privkey.pem"), key_pair.serialize_pem()).unwrap();
}
