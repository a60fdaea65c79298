use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        certbot::CertbotClient, dns::HickoryResolver, http::app_state::AppState,
        nginx::NginxController, persistence::PostgresPersistence,
    },
    application::{
        helpers::domain_policy::DomainPolicy,
        ports::{AttemptLimiter, Resolver},
    },
    infra::{
        InfraError,
        config::AppConfig,
        db::init_db,
        rate_limit::{InMemoryAttemptLimiter, RedisAttemptLimiter},
    },
    use_cases::{
        admission::{AdmissionLimits, DomainAdmission},
        certificates::CertificateManager,
        dns_verification::DnsVerificationEngine,
        proxy_config::ProxyConfigManager,
        tenant_domain::{
            BillingGate, ProvisioningSettings, TenantAccessRepo, TenantDomainRepo,
            TenantDomainUseCases,
        },
    },
};

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let pool = init_db(&config.database_url, config.database_max_connections).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let limiter: Arc<dyn AttemptLimiter> = match &config.redis_url {
        Some(url) => Arc::new(RedisAttemptLimiter::new(url).await?),
        None => {
            warn!("REDIS_URL not set; domain attempt limits are per-process only");
            Arc::new(InMemoryAttemptLimiter::new())
        }
    };

    let resolver: Arc<dyn Resolver> = match config.dns_server {
        Some(addr) => Arc::new(HickoryResolver::with_nameserver(addr)),
        None => Arc::new(HickoryResolver::new()?),
    };

    let admission = DomainAdmission::new(
        postgres_arc.clone() as Arc<dyn TenantDomainRepo>,
        postgres_arc.clone() as Arc<dyn TenantAccessRepo>,
        postgres_arc.clone() as Arc<dyn BillingGate>,
        limiter,
        DomainPolicy::new(&config.platform_domain, config.blocked_domains.clone()),
        AdmissionLimits {
            attempts_per_window: config.domain_attempt_limit,
            window_secs: config.domain_attempt_window_secs,
            daily_claims: config.domain_daily_claim_limit,
        },
        config.custom_domain_plans.clone(),
    );

    let dns = DnsVerificationEngine::new(resolver, &config.platform_domain, config.dns_timeout);

    let certificates = CertificateManager::new(
        Arc::new(CertbotClient::new(
            config.certbot_bin.clone(),
            config.certbot_timeout,
        )),
        config.certs_root.clone(),
    );

    let controller = NginxController::new(
        config.nginx_bin.clone(),
        &config.proxy_reload_command,
        config.proxy_command_timeout,
    )
    .map_err(|_| InfraError::ConfigInvalid {
        var: "PROXY_RELOAD_COMMAND",
    })?;
    let proxy = ProxyConfigManager::new(
        Arc::new(controller),
        config.nginx_sites_available.clone(),
        config.nginx_sites_enabled.clone(),
    );

    let domain_use_cases = TenantDomainUseCases::new(
        postgres_arc as Arc<dyn TenantDomainRepo>,
        Arc::new(admission),
        Arc::new(dns),
        Arc::new(certificates),
        Arc::new(proxy),
        ProvisioningSettings {
            upstream_host: config.upstream_host.clone(),
            default_upstream_port: config.default_upstream_port,
            acme_webroot: config.acme_webroot.clone(),
            default_contact_email: config.acme_contact_email.clone(),
        },
    );

    info!(platform_domain = %config.platform_domain, "Domain provisioning ready");

    Ok(AppState {
        config: Arc::new(config),
        domain_use_cases: Arc::new(domain_use_cases),
    })
}

pub fn init_tracing(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_domains=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don't show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let json_layer = log_file
        .and_then(|path| match File::create(path) {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("cannot create log file {}: {e}", path.display());
                None
            }
        })
        .map(|file| {
            fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_current_span(true)
                .with_span_list(true)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
