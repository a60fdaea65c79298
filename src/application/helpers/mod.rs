pub mod domain_policy;
pub mod domain_parsing;
