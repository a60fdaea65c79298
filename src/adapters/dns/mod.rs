use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{ResolveError, TokioResolver};
use tracing::{debug, warn};

use crate::application::ports::{LookupError, Resolver};
use crate::infra::error::InfraError;

pub struct HickoryResolver {
    resolver: TokioResolver,
}

impl HickoryResolver {
    /// Create resolver using system DNS configuration.
    pub fn new() -> Result<Self, InfraError> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(InfraError::Resolver)?
            .build();
        Ok(Self { resolver })
    }

    /// Create resolver pointing to a specific DNS server (for local dev with CoreDNS).
    pub fn with_nameserver(addr: SocketAddr) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default()).build();
        Self { resolver }
    }
}

/// Append trailing dot to make it an FQDN and prevent search domain appending.
fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

fn classify(record_type: &'static str, name: &str, e: ResolveError) -> LookupError {
    if e.is_no_records_found() || e.is_nx_domain() {
        debug!(name = %name, record_type, "No records");
        LookupError::NoRecords { record_type }
    } else {
        warn!(name = %name, record_type, error = %e, "DNS lookup failed");
        LookupError::Failed(e.to_string())
    }
}

#[async_trait]
impl Resolver for HickoryResolver {
    async fn lookup_cname(&self, name: &str) -> Result<Vec<String>, LookupError> {
        let lookup = self
            .resolver
            .lookup(fqdn(name), RecordType::CNAME)
            .await
            .map_err(|e| classify("CNAME", name, e))?;

        let targets: Vec<String> = lookup
            .records()
            .iter()
            .filter_map(|record| record.data().as_cname())
            .map(|cname| cname.to_string())
            .collect();
        debug!(name = %name, targets = ?targets, "Found CNAME");
        Ok(targets)
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<Vec<String>>, LookupError> {
        let lookup = self
            .resolver
            .txt_lookup(fqdn(name))
            .await
            .map_err(|e| classify("TXT", name, e))?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|segment| String::from_utf8_lossy(segment).into_owned())
                    .collect()
            })
            .collect())
    }

    async fn lookup_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, LookupError> {
        let lookup = self
            .resolver
            .ipv4_lookup(fqdn(name))
            .await
            .map_err(|e| classify("A", name, e))?;

        Ok(lookup.iter().map(|a| a.0).collect())
    }
}
