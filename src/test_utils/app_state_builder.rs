//! `AppState` over a `TestDomainStack`, for HTTP-level tests.

use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use secrecy::SecretString;
use uuid::Uuid;

use super::{TEST_PLATFORM_DOMAIN, TestDomainStack};
use crate::{
    adapters::http::{app_state::AppState, routes},
    application::jwt,
    infra::config::AppConfig,
    use_cases::tenant_domain::TenantDomainUseCases,
};

const TEST_JWT_SECRET: &str = "test_jwt_secret_test_jwt_secret_";

pub struct TestAppStateBuilder {
    domain_use_cases: Arc<TenantDomainUseCases>,
    jwt_secret: SecretString,
}

impl TestAppStateBuilder {
    pub fn new(stack: &TestDomainStack) -> Self {
        Self {
            domain_use_cases: stack.use_cases.clone(),
            jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        }
    }

    /// A session token for `actor_id`, signed with the test secret.
    pub fn token_for(&self, actor_id: Uuid) -> String {
        jwt::issue(actor_id, &self.jwt_secret, time::Duration::hours(1)).unwrap()
    }

    pub fn build(self) -> AppState {
        let config = Arc::new(AppConfig {
            jwt_secret: self.jwt_secret,
            database_url: String::new(),
            database_max_connections: 1,
            redis_url: None,
            bind_addr: "127.0.0.1:3001".parse().unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            platform_domain: TEST_PLATFORM_DOMAIN.to_string(),
            dns_server: None,
            dns_timeout: std::time::Duration::from_secs(2),
            certbot_bin: "certbot".to_string(),
            certs_root: "/nonexistent/live".into(),
            acme_contact_email: "ops@platform.test".to_string(),
            acme_webroot: "/nonexistent/acme".into(),
            certbot_timeout: std::time::Duration::from_secs(5),
            nginx_bin: "nginx".to_string(),
            nginx_sites_available: "/nonexistent/sites-available".into(),
            nginx_sites_enabled: "/nonexistent/sites-enabled".into(),
            proxy_reload_command: "true".to_string(),
            proxy_command_timeout: std::time::Duration::from_secs(5),
            upstream_host: "127.0.0.1".to_string(),
            default_upstream_port: 3000,
            custom_domain_plans: vec!["pro".to_string(), "enterprise".to_string()],
            domain_attempt_limit: 5,
            domain_attempt_window_secs: 3600,
            domain_daily_claim_limit: 20,
            blocked_domains: Vec::new(),
            log_file: None,
        });

        AppState {
            config,
            domain_use_cases: self.domain_use_cases,
        }
    }

    /// The `/api` router with this state, without the outer layers.
    pub fn router(self) -> Router {
        routes::router().with_state(self.build())
    }
}
