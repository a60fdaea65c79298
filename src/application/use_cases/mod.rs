pub mod admission;
pub mod certificates;
pub mod dns_verification;
pub mod proxy_config;
pub mod tenant_domain;
