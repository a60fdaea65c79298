use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::app_error::{AppResult, ExternalKind};
use crate::application::ports::{CertificateClient, CommandOutput};
use crate::infra::process::run_command;

/// Drives the `certbot` CLI. Issuance uses the nginx installer so the HTTP-01
/// challenge is answered by the running proxy.
pub struct CertbotClient {
    binary: String,
    timeout: Duration,
}

impl CertbotClient {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> AppResult<CommandOutput> {
        run_command(
            ExternalKind::CertificateClient,
            &self.binary,
            args,
            self.timeout,
        )
        .await
    }
}

pub fn issue_args<'a>(domain: &'a str, contact_email: &'a str) -> Vec<&'a str> {
    vec![
        "certonly",
        "--nginx",
        "-d",
        domain,
        "--cert-name",
        domain,
        "--non-interactive",
        "--agree-tos",
        "--email",
        contact_email,
    ]
}

pub fn renew_args(domain: &str) -> Vec<&str> {
    vec!["renew", "--cert-name", domain, "--non-interactive"]
}

pub fn revoke_args(domain: &str) -> Vec<&str> {
    vec![
        "revoke",
        "--cert-name",
        domain,
        "--delete-after-revoke",
        "--non-interactive",
    ]
}

#[async_trait]
impl CertificateClient for CertbotClient {
    async fn issue(&self, domain: &str, contact_email: &str) -> AppResult<CommandOutput> {
        info!(domain = %domain, "Requesting certificate");
        self.run(&issue_args(domain, contact_email)).await
    }

    async fn renew(&self, domain: &str) -> AppResult<CommandOutput> {
        self.run(&renew_args(domain)).await
    }

    async fn revoke(&self, domain: &str) -> AppResult<CommandOutput> {
        self.run(&revoke_args(domain)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuance_is_non_interactive_with_nginx_challenge() {
        let args = issue_args("shop.example.com", "ops@example.com");
        assert!(args.contains(&"--nginx"));
        assert!(args.contains(&"--non-interactive"));
        assert!(args.contains(&"--agree-tos"));
        assert!(args.windows(2).any(|w| w == ["-d", "shop.example.com"]));
        assert!(args.windows(2).any(|w| w == ["--email", "ops@example.com"]));
    }

    #[test]
    fn revoke_deletes_certificate_materials() {
        let args = revoke_args("shop.example.com");
        assert!(args.contains(&"--delete-after-revoke"));
        assert!(args.windows(2).any(|w| w == ["--cert-name", "shop.example.com"]));
    }

    #[tokio::test]
    async fn client_reports_exit_status_of_the_binary() {
        let client = CertbotClient::new("false", Duration::from_secs(5));
        let output = client.renew("shop.example.com").await.unwrap();
        assert!(!output.success);
    }
}
