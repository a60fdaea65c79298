use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;

use super::InfraError;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Shared counter store for attempt limits. Without it the limiter is
    /// process-local, which is only correct for a single instance.
    pub redis_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// The platform's own domain; tenants CNAME to `{slug}.{platform_domain}`.
    pub platform_domain: String,
    /// Optional DNS server address for lookups (e.g., "127.0.0.1:5353" for local CoreDNS).
    pub dns_server: Option<SocketAddr>,
    pub dns_timeout: Duration,
    pub certbot_bin: String,
    /// Root of the `{domain}/{fullchain,privkey,cert,chain}.pem` layout.
    pub certs_root: PathBuf,
    pub acme_contact_email: String,
    /// Directory the proxy serves `/.well-known/acme-challenge/` from.
    pub acme_webroot: PathBuf,
    pub certbot_timeout: Duration,
    pub nginx_bin: String,
    pub nginx_sites_available: PathBuf,
    pub nginx_sites_enabled: PathBuf,
    pub proxy_reload_command: String,
    pub proxy_command_timeout: Duration,
    pub upstream_host: String,
    pub default_upstream_port: u16,
    /// Plan codes that include custom domains.
    pub custom_domain_plans: Vec<String>,
    pub domain_attempt_limit: u64,
    pub domain_attempt_window_secs: u64,
    pub domain_daily_claim_limit: u64,
    pub blocked_domains: Vec<String>,
    /// Optional path for structured JSON logs.
    pub log_file: Option<PathBuf>,
}

fn required(var: &'static str) -> Result<String, InfraError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(InfraError::ConfigMissing { var })
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let jwt_secret = SecretString::new(required("JWT_SECRET")?.into());
        let database_url = required("DATABASE_URL")?;
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let redis_url = optional("REDIS_URL");

        let bind_addr: SocketAddr = optional("BIND_ADDR")
            .map(|s| s.parse())
            .transpose()
            .map_err(|_| InfraError::ConfigInvalid { var: "BIND_ADDR" })?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3001)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;

        let platform_domain = required("PLATFORM_DOMAIN")?
            .trim()
            .trim_end_matches('.')
            .to_ascii_lowercase();
        let dns_server: Option<SocketAddr> = optional("DNS_SERVER")
            .map(|s| s.parse())
            .transpose()
            .map_err(|_| InfraError::ConfigInvalid { var: "DNS_SERVER" })?;
        let dns_timeout_secs: u64 = get_env_default("DNS_TIMEOUT_SECS", 10);

        let certbot_bin: String = get_env_default("CERTBOT_BIN", "certbot".to_string());
        let certs_root: String =
            get_env_default("CERTS_ROOT", "/etc/letsencrypt/live".to_string());
        let acme_contact_email = required("ACME_CONTACT_EMAIL")?;
        let acme_webroot: String =
            get_env_default("ACME_WEBROOT", "/var/www/letsencrypt".to_string());
        let certbot_timeout_secs: u64 = get_env_default("CERTBOT_TIMEOUT_SECS", 150);

        let nginx_bin: String = get_env_default("NGINX_BIN", "nginx".to_string());
        let nginx_sites_available: String = get_env_default(
            "NGINX_SITES_AVAILABLE",
            "/etc/nginx/sites-available".to_string(),
        );
        let nginx_sites_enabled: String =
            get_env_default("NGINX_SITES_ENABLED", "/etc/nginx/sites-enabled".to_string());
        let proxy_reload_command: String =
            get_env_default("PROXY_RELOAD_COMMAND", "systemctl reload nginx".to_string());
        let proxy_command_timeout_secs: u64 = get_env_default("PROXY_COMMAND_TIMEOUT_SECS", 30);

        let upstream_host: String = get_env_default("UPSTREAM_HOST", "127.0.0.1".to_string());
        let default_upstream_port: u16 = get_env_default("DEFAULT_UPSTREAM_PORT", 3000);

        let custom_domain_plans =
            comma_list(&get_env_default("CUSTOM_DOMAIN_PLANS", "pro,enterprise".to_string()));
        let domain_attempt_limit: u64 = get_env_default("DOMAIN_ATTEMPT_LIMIT", 5);
        let domain_attempt_window_secs: u64 = get_env_default("DOMAIN_ATTEMPT_WINDOW_SECS", 3600);
        let domain_daily_claim_limit: u64 = get_env_default("DOMAIN_DAILY_CLAIM_LIMIT", 20);
        let blocked_domains = comma_list(&get_env_default("BLOCKED_DOMAINS", String::new()));
        let log_file = optional("LOG_FILE").map(PathBuf::from);

        Ok(Self {
            jwt_secret,
            database_url,
            database_max_connections,
            redis_url,
            bind_addr,
            cors_origin,
            platform_domain,
            dns_server,
            dns_timeout: Duration::from_secs(dns_timeout_secs),
            certbot_bin,
            certs_root: PathBuf::from(certs_root),
            acme_contact_email,
            acme_webroot: PathBuf::from(acme_webroot),
            certbot_timeout: Duration::from_secs(certbot_timeout_secs),
            nginx_bin,
            nginx_sites_available: PathBuf::from(nginx_sites_available),
            nginx_sites_enabled: PathBuf::from(nginx_sites_enabled),
            proxy_reload_command,
            proxy_command_timeout: Duration::from_secs(proxy_command_timeout_secs),
            upstream_host,
            default_upstream_port,
            custom_domain_plans,
            domain_attempt_limit,
            domain_attempt_window_secs,
            domain_daily_claim_limit,
            blocked_domains,
            log_file,
        })
    }
}
