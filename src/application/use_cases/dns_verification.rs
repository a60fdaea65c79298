use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::app_error::{AppError, AppResult, ExternalKind};
use crate::application::ports::{LookupError, Resolver};

/// Label under which tenants publish their verification token.
pub const VERIFICATION_TXT_LABEL: &str = "_platform-verification";

/// Outcome of checking a domain's DNS against what the platform expects.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub domain: String,
    pub cname_valid: bool,
    pub txt_valid: bool,
    pub overall_valid: bool,
    pub expected_cname: String,
    pub found_cnames: Vec<String>,
    pub txt_host: String,
    pub found_txt: Vec<String>,
    /// One entry per failed check, with the concrete reason.
    pub errors: Vec<String>,
    pub message: String,
}

pub fn expected_cname_target(slug: &str, platform_domain: &str) -> String {
    format!("{slug}.{platform_domain}")
}

pub fn verification_txt_host(domain: &str) -> String {
    format!("{VERIFICATION_TXT_LABEL}.{domain}")
}

fn normalize_target(target: &str) -> String {
    target.trim().trim_end_matches('.').to_ascii_lowercase()
}

struct CheckOutcome<T> {
    valid: bool,
    found: Vec<T>,
    error: Option<String>,
}

/// Stateless DNS checks for domain ownership. Safe to call repeatedly; it
/// never writes anything.
pub struct DnsVerificationEngine {
    resolver: Arc<dyn Resolver>,
    platform_domain: String,
    lookup_timeout: Duration,
}

impl DnsVerificationEngine {
    pub fn new(resolver: Arc<dyn Resolver>, platform_domain: &str, lookup_timeout: Duration) -> Self {
        Self {
            resolver,
            platform_domain: platform_domain.trim_end_matches('.').to_ascii_lowercase(),
            lookup_timeout,
        }
    }

    pub fn platform_domain(&self) -> &str {
        &self.platform_domain
    }

    /// Run the CNAME and TXT checks for `domain`. Both checks always run so the
    /// caller can report every problem at once.
    ///
    /// DNS negative answers and resolver errors land in the result; `Err` means
    /// the resolver did not answer within the timeout.
    #[instrument(skip(self, verification_token))]
    pub async fn verify(
        &self,
        domain: &str,
        tenant_slug: &str,
        verification_token: &str,
    ) -> AppResult<VerificationResult> {
        let expected_cname = expected_cname_target(tenant_slug, &self.platform_domain);
        let txt_host = verification_txt_host(domain);

        let cname = self.check_cname(domain, &expected_cname).await?;
        let txt = self.check_txt(&txt_host, verification_token).await?;

        let overall_valid = cname.valid && txt.valid;
        let errors: Vec<String> = [cname.error, txt.error].into_iter().flatten().collect();

        let message = if overall_valid {
            "Domain verified successfully".to_string()
        } else {
            let mut labels = Vec::new();
            if !cname.valid {
                labels.push("CNAME invalid");
            }
            if !txt.valid {
                labels.push("TXT invalid");
            }
            format!("{}: {}", labels.join(", "), errors.join("; "))
        };

        debug!(
            domain = %domain,
            cname_valid = cname.valid,
            txt_valid = txt.valid,
            "DNS verification finished"
        );

        Ok(VerificationResult {
            domain: domain.to_string(),
            cname_valid: cname.valid,
            txt_valid: txt.valid,
            overall_valid,
            expected_cname,
            found_cnames: cname.found,
            txt_host,
            found_txt: txt.found,
            errors,
            message,
        })
    }

    async fn check_cname(&self, domain: &str, expected: &str) -> AppResult<CheckOutcome<String>> {
        let lookup = self
            .with_timeout("CNAME", domain, self.resolver.lookup_cname(domain))
            .await?;

        match lookup {
            Ok(targets) => {
                let found: Vec<String> = targets.iter().map(|t| normalize_target(t)).collect();
                let valid = found.iter().any(|t| t == expected);
                let error = if valid {
                    None
                } else if found.is_empty() {
                    Some(format!("No CNAME record found for {domain}; expected {expected}"))
                } else {
                    Some(format!(
                        "CNAME for {domain} points to {} but expected {expected}",
                        found.join(", ")
                    ))
                };
                Ok(CheckOutcome { valid, found, error })
            }
            Err(LookupError::NoRecords { .. }) => {
                // Diagnostic only: tell tenants who used an A record what to change.
                let a_records = match self
                    .with_timeout("A", domain, self.resolver.lookup_a(domain))
                    .await
                {
                    Ok(Ok(ips)) => ips,
                    _ => Vec::new(),
                };
                let error = if a_records.is_empty() {
                    format!("No CNAME record found for {domain}; expected {expected}")
                } else {
                    let ips: Vec<String> = a_records.iter().map(|ip| ip.to_string()).collect();
                    format!(
                        "{domain} uses an A record ({}); switch to a CNAME record pointing to {expected}",
                        ips.join(", ")
                    )
                };
                Ok(CheckOutcome {
                    valid: false,
                    found: Vec::new(),
                    error: Some(error),
                })
            }
            Err(LookupError::Failed(e)) => {
                warn!(domain = %domain, error = %e, "CNAME lookup failed");
                Ok(CheckOutcome {
                    valid: false,
                    found: Vec::new(),
                    error: Some(format!("DNS lookup failed for CNAME {domain}: {e}")),
                })
            }
        }
    }

    async fn check_txt(&self, txt_host: &str, token: &str) -> AppResult<CheckOutcome<String>> {
        let lookup = self
            .with_timeout("TXT", txt_host, self.resolver.lookup_txt(txt_host))
            .await?;

        match lookup {
            Ok(records) => {
                let found: Vec<String> = records
                    .into_iter()
                    .flatten()
                    .map(|segment| segment.trim().to_string())
                    .collect();
                let valid = found.iter().any(|value| value == token);
                let error = if valid {
                    None
                } else if found.is_empty() {
                    Some(format!("No TXT record found at {txt_host}"))
                } else {
                    Some(format!(
                        "TXT record at {txt_host} does not contain the verification token"
                    ))
                };
                Ok(CheckOutcome { valid, found, error })
            }
            Err(LookupError::NoRecords { .. }) => Ok(CheckOutcome {
                valid: false,
                found: Vec::new(),
                error: Some(format!("No TXT record found at {txt_host}")),
            }),
            Err(LookupError::Failed(e)) => {
                warn!(host = %txt_host, error = %e, "TXT lookup failed");
                Ok(CheckOutcome {
                    valid: false,
                    found: Vec::new(),
                    error: Some(format!("DNS lookup failed for TXT {txt_host}: {e}")),
                })
            }
        }
    }

    async fn with_timeout<T>(
        &self,
        record_type: &str,
        name: &str,
        fut: impl Future<Output = T>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.lookup_timeout, fut)
            .await
            .map_err(|_| {
                AppError::external(
                    ExternalKind::Dns,
                    format!(
                        "{record_type} lookup for {name} timed out after {}s",
                        self.lookup_timeout.as_secs()
                    ),
                )
            })
    }
}
