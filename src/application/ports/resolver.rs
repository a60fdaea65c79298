use std::net::Ipv4Addr;

use async_trait::async_trait;
use thiserror::Error;

/// Distinguishes a clean negative answer from a resolver that could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no {record_type} records found")]
    NoRecords { record_type: &'static str },

    #[error("DNS lookup failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Resolver: Send + Sync {
    /// CNAME targets for `name`, as returned by the resolver (may carry a
    /// trailing dot).
    async fn lookup_cname(&self, name: &str) -> Result<Vec<String>, LookupError>;

    /// TXT records for `name`. Each inner vec holds the character-strings of
    /// one record.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<Vec<String>>, LookupError>;

    async fn lookup_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, LookupError>;
}
