pub mod tenant_domain;
