//! A fully wired `TenantDomainUseCases` over in-memory repos, fakes and a
//! temp directory standing in for the certs root and the proxy config tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use uuid::Uuid;

use super::{
    FakeCertificateClient, FakeProxyController, FakeResolver, InMemoryBillingGate,
    InMemoryTenantAccessRepo, InMemoryTenantDomainRepo, create_test_tenant,
};
use crate::{
    application::helpers::domain_policy::DomainPolicy,
    domain::entities::tenant_domain::TenantDomain,
    infra::rate_limit::InMemoryAttemptLimiter,
    use_cases::{
        admission::{AdmissionLimits, DomainAdmission},
        certificates::CertificateManager,
        dns_verification::DnsVerificationEngine,
        proxy_config::ProxyConfigManager,
        tenant_domain::{ProvisioningSettings, TenantDomainUseCases},
    },
};

pub const TEST_PLATFORM_DOMAIN: &str = "platform.test";

type ClientFactory = Box<dyn FnOnce(&Path) -> FakeCertificateClient>;

pub struct TestDomainStack {
    pub use_cases: Arc<TenantDomainUseCases>,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub repo: Arc<InMemoryTenantDomainRepo>,
    pub access: Arc<InMemoryTenantAccessRepo>,
    pub billing: Arc<InMemoryBillingGate>,
    pub resolver: Arc<FakeResolver>,
    pub certificate_client: Arc<FakeCertificateClient>,
    pub proxy_controller: Arc<FakeProxyController>,
    proxy: Arc<ProxyConfigManager>,
    certs_root: PathBuf,
    _dir: TempDir,
}

impl TestDomainStack {
    /// A "mytenant" store on the "pro" plan, owned by `owner_id`, with no
    /// domain yet.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestDomainStackBuilder {
        TestDomainStackBuilder::default()
    }

    pub fn record(&self) -> TenantDomain {
        self.repo.get(self.tenant_id).unwrap()
    }

    /// Panics if any stored tenant breaks a cross-field invariant or was left
    /// in an in-flight status once an operation returned.
    pub fn assert_invariants(&self) {
        for tenant in self.repo.tenants.lock().unwrap().values() {
            if let Some(rule) = tenant.invariant_violation() {
                panic!("invariant violated for {}: {rule}: {tenant:?}", tenant.slug);
            }
            if tenant.custom_domain_status.is_transient()
                || tenant.ssl_certificate_status.is_transient()
            {
                panic!("{} left in a transient status: {tenant:?}", tenant.slug);
            }
        }
    }

    pub fn certs_root(&self) -> &Path {
        &self.certs_root
    }

    pub async fn proxy_config_exists(&self, domain: &str) -> bool {
        self.proxy.exists(domain).await
    }

    /// Claim `domain` as the owner, publish the right DNS records and verify.
    pub async fn verify_domain(&self, domain: &str) -> TenantDomain {
        let config = self
            .use_cases
            .claim_domain(self.tenant_id, self.owner_id, domain)
            .await
            .unwrap();
        let instructions = config.instructions.unwrap();
        self.resolver
            .publish_cname(&instructions.cname.name, &instructions.cname.value);
        self.resolver
            .publish_txt(&instructions.txt.name, vec![vec![instructions.txt.value]]);

        let outcome = self
            .use_cases
            .verify_domain(self.tenant_id, self.owner_id)
            .await
            .unwrap();
        assert!(outcome.verified, "verification failed: {}", outcome.message);
        outcome.record
    }
}

impl Default for TestDomainStack {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TestDomainStackBuilder {
    resolver: Option<FakeResolver>,
    dns_timeout: Duration,
    certificate_client: Option<ClientFactory>,
    proxy_controller: Option<FakeProxyController>,
    limits: AdmissionLimits,
}

impl Default for TestDomainStackBuilder {
    fn default() -> Self {
        Self {
            resolver: None,
            dns_timeout: Duration::from_secs(2),
            certificate_client: None,
            proxy_controller: None,
            limits: AdmissionLimits::default(),
        }
    }
}

impl TestDomainStackBuilder {
    pub fn resolver(mut self, resolver: FakeResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    /// The factory receives the certs root so the fake can mint certificates
    /// where the manager reads them.
    pub fn certificate_client(
        mut self,
        factory: impl FnOnce(&Path) -> FakeCertificateClient + 'static,
    ) -> Self {
        self.certificate_client = Some(Box::new(factory));
        self
    }

    pub fn proxy_controller(mut self, controller: FakeProxyController) -> Self {
        self.proxy_controller = Some(controller);
        self
    }

    pub fn limits(mut self, limits: AdmissionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> TestDomainStack {
        let dir = tempfile::tempdir().unwrap();
        let certs_root = dir.path().join("live");
        std::fs::create_dir_all(&certs_root).unwrap();

        let tenant_id = Uuid::new_v4();
        let owner_id = Uuid::new_v4();

        let repo = Arc::new(InMemoryTenantDomainRepo::new());
        repo.insert(create_test_tenant(|t| t.tenant_id = tenant_id));
        let access = Arc::new(InMemoryTenantAccessRepo::new());
        access.add_tenant(tenant_id, owner_id);
        let billing = Arc::new(InMemoryBillingGate::new());
        billing.set(tenant_id, "pro", true);

        let resolver = Arc::new(self.resolver.unwrap_or_default());
        let certificate_client = Arc::new(match self.certificate_client {
            Some(factory) => factory(&certs_root),
            None => FakeCertificateClient::new().issuing_into(&certs_root, 2099),
        });
        let proxy_controller = Arc::new(self.proxy_controller.unwrap_or_default());

        let admission = DomainAdmission::new(
            repo.clone(),
            access.clone(),
            billing.clone(),
            Arc::new(InMemoryAttemptLimiter::new()),
            DomainPolicy::new(TEST_PLATFORM_DOMAIN, Vec::new()),
            self.limits,
            vec!["pro".to_string(), "enterprise".to_string()],
        );
        let dns = DnsVerificationEngine::new(resolver.clone(), TEST_PLATFORM_DOMAIN, self.dns_timeout);
        let certificates = CertificateManager::new(certificate_client.clone(), certs_root.clone());
        let proxy = Arc::new(ProxyConfigManager::new(
            proxy_controller.clone(),
            dir.path().join("sites-available"),
            dir.path().join("sites-enabled"),
        ));

        let use_cases = Arc::new(TenantDomainUseCases::new(
            repo.clone(),
            Arc::new(admission),
            Arc::new(dns),
            Arc::new(certificates),
            proxy.clone(),
            ProvisioningSettings {
                upstream_host: "127.0.0.1".to_string(),
                default_upstream_port: 3000,
                acme_webroot: dir.path().join("acme"),
                default_contact_email: "ops@platform.test".to_string(),
            },
        ));

        TestDomainStack {
            use_cases,
            tenant_id,
            owner_id,
            repo,
            access,
            billing,
            resolver,
            certificate_client,
            proxy_controller,
            proxy,
            certs_root,
            _dir: dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::tenant_domain::DomainStatus;

    #[test]
    #[should_panic(expected = "transient status")]
    fn invariant_check_rejects_status_left_in_flight() {
        let stack = TestDomainStack::new();
        let mut tenant = stack.record();
        tenant.custom_domain = Some("shop.example.com".to_string());
        tenant.custom_domain_dns_record = Some("platform-verification=abc".to_string());
        tenant.custom_domain_status = DomainStatus::Verifying;
        stack.repo.insert(tenant);
        stack.assert_invariants();
    }
}
