use async_trait::async_trait;

use super::CommandOutput;
use crate::app_error::AppResult;

/// An ACME-capable certificate client.
///
/// Implementations return `Ok` whenever the client ran to completion, even if
/// it exited non-zero; `Err` is reserved for failures to run it at all
/// (spawn error, timeout).
#[async_trait]
pub trait CertificateClient: Send + Sync {
    /// Issue a certificate using the proxy-integrated HTTP-01 challenge.
    async fn issue(&self, domain: &str, contact_email: &str) -> AppResult<CommandOutput>;

    async fn renew(&self, domain: &str) -> AppResult<CommandOutput>;

    /// Revoke and delete the certificate materials for `domain`.
    async fn revoke(&self, domain: &str) -> AppResult<CommandOutput>;
}
