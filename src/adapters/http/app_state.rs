use std::sync::Arc;

use axum::extract::FromRef;

use crate::{infra::config::AppConfig, use_cases::tenant_domain::TenantDomainUseCases};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub domain_use_cases: Arc<TenantDomainUseCases>,
}

impl FromRef<AppState> for Arc<TenantDomainUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.domain_use_cases.clone()
    }
}
