use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use x509_parser::pem::parse_x509_pem;

use crate::app_error::{AppError, AppResult, ExternalKind};
use crate::application::ports::{CertificateClient, CommandOutput};

/// Marker the ACME client prints when a renewal was skipped.
const NOT_DUE_MARKER: &str = "not yet due for renewal";

const UNUSABLE_CERTIFICATE: &str = "Certificate on disk is expired or unreadable";

/// Conventional on-disk layout: `{certs_root}/{domain}/{fullchain,privkey,cert,chain}.pem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertPaths {
    pub fullchain: PathBuf,
    pub privkey: PathBuf,
    pub cert: PathBuf,
    pub chain: PathBuf,
}

impl CertPaths {
    pub fn for_domain(certs_root: &Path, domain: &str) -> Self {
        let dir = certs_root.join(domain);
        Self {
            fullchain: dir.join("fullchain.pem"),
            privkey: dir.join("privkey.pem"),
            cert: dir.join("cert.pem"),
            chain: dir.join("chain.pem"),
        }
    }
}

/// Certificate facts read from disk, never from application records.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    pub domain: String,
    pub exists: bool,
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_until_expiry: Option<i64>,
    pub paths: CertPaths,
}

impl CertificateInfo {
    /// True when the certificate exists and has no days left.
    pub fn is_expired(&self) -> bool {
        self.exists && self.days_until_expiry.is_some_and(|d| d <= 0)
    }
}

/// Result of an issuance or renewal that ran to completion.
#[derive(Debug, Clone)]
pub enum CertificateOutcome {
    Succeeded {
        info: CertificateInfo,
        output: CommandOutput,
        /// False when the authority reported nothing was due.
        renewed: bool,
    },
    Failed {
        reason: String,
        output: CommandOutput,
    },
}

/// Parse the `notAfter` of the first certificate in a PEM blob.
pub fn parse_certificate_expiry(pem: &[u8]) -> Result<DateTime<Utc>, String> {
    let (_, pem) = parse_x509_pem(pem).map_err(|e| format!("Failed to parse PEM: {e}"))?;
    let (_, cert) = x509_parser::parse_x509_certificate(&pem.contents)
        .map_err(|e| format!("Failed to parse X.509 certificate: {e}"))?;

    DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
        .ok_or_else(|| "Invalid not_after timestamp".to_string())
}

/// Drives the external ACME client and reads certificate metadata back from
/// the filesystem. Holds no state of its own.
pub struct CertificateManager {
    client: Arc<dyn CertificateClient>,
    certs_root: PathBuf,
}

impl CertificateManager {
    pub fn new(client: Arc<dyn CertificateClient>, certs_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            certs_root: certs_root.into(),
        }
    }

    pub fn paths(&self, domain: &str) -> CertPaths {
        CertPaths::for_domain(&self.certs_root, domain)
    }

    #[instrument(skip(self))]
    pub async fn get_info(&self, domain: &str) -> AppResult<CertificateInfo> {
        self.get_info_at(domain, Utc::now()).await
    }

    pub async fn get_info_at(&self, domain: &str, now: DateTime<Utc>) -> AppResult<CertificateInfo> {
        let paths = self.paths(domain);

        let pem = match tokio::fs::read(&paths.cert).await {
            Ok(pem) => pem,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(CertificateInfo {
                    domain: domain.to_string(),
                    exists: false,
                    valid: false,
                    expires_at: None,
                    days_until_expiry: None,
                    paths,
                });
            }
            Err(e) => {
                return Err(AppError::external(
                    ExternalKind::Filesystem,
                    format!("cannot read {}: {e}", paths.cert.display()),
                ));
            }
        };

        let (expires_at, days_until_expiry) = match parse_certificate_expiry(&pem) {
            Ok(expiry) => (Some(expiry), Some((expiry - now).num_days())),
            Err(e) => {
                warn!(domain = %domain, error = %e, "Unreadable certificate on disk");
                (None, None)
            }
        };

        Ok(CertificateInfo {
            domain: domain.to_string(),
            exists: true,
            valid: days_until_expiry.is_some_and(|d| d > 0),
            expires_at,
            days_until_expiry,
            paths,
        })
    }

    /// Request a new certificate. The exit status alone is not trusted: the
    /// certificate must be on disk, parseable and unexpired afterwards.
    #[instrument(skip(self))]
    pub async fn request(&self, domain: &str, contact_email: &str) -> AppResult<CertificateOutcome> {
        let output = self.client.issue(domain, contact_email).await?;

        if !output.success {
            warn!(
                domain = %domain,
                exit_code = ?output.exit_code,
                stderr = %output.stderr,
                "Certificate issuance failed"
            );
            return Ok(CertificateOutcome::Failed {
                reason: format!("Certificate request failed: {}", output.summary()),
                output,
            });
        }

        let info = self.get_info(domain).await?;
        if !info.exists {
            warn!(domain = %domain, "Issuance reported success but no certificate on disk");
            return Ok(CertificateOutcome::Failed {
                reason: "Certificate client reported success but no certificate file was found"
                    .to_string(),
                output,
            });
        }
        if !info.valid {
            warn!(domain = %domain, expires_at = ?info.expires_at, "Issued certificate is expired or unreadable");
            return Ok(CertificateOutcome::Failed {
                reason: UNUSABLE_CERTIFICATE.to_string(),
                output,
            });
        }

        info!(domain = %domain, expires_at = ?info.expires_at, "Certificate issued");
        Ok(CertificateOutcome::Succeeded {
            info,
            output,
            renewed: true,
        })
    }

    /// Renew if due. A renewal the authority skips is still a success.
    #[instrument(skip(self))]
    pub async fn renew(&self, domain: &str) -> AppResult<CertificateOutcome> {
        let output = self.client.renew(domain).await?;

        if !output.success {
            warn!(domain = %domain, stderr = %output.stderr, "Certificate renewal failed");
            return Ok(CertificateOutcome::Failed {
                reason: format!("Certificate renewal failed: {}", output.summary()),
                output,
            });
        }

        let renewed = !output.stdout.contains(NOT_DUE_MARKER);
        let info = self.get_info(domain).await?;
        if !info.exists {
            return Ok(CertificateOutcome::Failed {
                reason: "No certificate found on disk after renewal".to_string(),
                output,
            });
        }
        if !info.valid {
            warn!(domain = %domain, expires_at = ?info.expires_at, "Renewed certificate is expired or unreadable");
            return Ok(CertificateOutcome::Failed {
                reason: UNUSABLE_CERTIFICATE.to_string(),
                output,
            });
        }

        info!(domain = %domain, renewed, expires_at = ?info.expires_at, "Certificate renewal finished");
        Ok(CertificateOutcome::Succeeded {
            info,
            output,
            renewed,
        })
    }

    /// Revoke and delete the certificate materials.
    #[instrument(skip(self))]
    pub async fn revoke(&self, domain: &str) -> AppResult<CommandOutput> {
        let output = self.client.revoke(domain).await?;
        if !output.success {
            warn!(domain = %domain, stderr = %output.stderr, "Certificate revoke reported an error");
        }
        Ok(output)
    }
}
