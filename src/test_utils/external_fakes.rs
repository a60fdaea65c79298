//! Scriptable fakes for the DNS, ACME and proxy ports.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::write_test_certificate;
use crate::{
    app_error::AppResult,
    application::ports::{CertificateClient, CommandOutput, LookupError, ProxyController, Resolver},
};

fn key(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

// ============================================================================
// Resolver
// ============================================================================

/// Answers from in-memory zones. Unknown names get a clean NoRecords.
#[derive(Default)]
pub struct FakeResolver {
    cnames: Mutex<HashMap<String, Result<Vec<String>, LookupError>>>,
    txt: Mutex<HashMap<String, Vec<Vec<String>>>>,
    a: Mutex<HashMap<String, Vec<Ipv4Addr>>>,
    delay: Option<Duration>,
    queries: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cname(self, name: &str, target: &str) -> Self {
        self.publish_cname(name, target);
        self
    }

    pub fn with_txt(self, name: &str, records: Vec<Vec<String>>) -> Self {
        self.publish_txt(name, records);
        self
    }

    pub fn with_a(self, name: &str, ip: Ipv4Addr) -> Self {
        self.a.lock().unwrap().entry(key(name)).or_default().push(ip);
        self
    }

    pub fn with_cname_failure(self, name: &str, message: &str) -> Self {
        self.cnames
            .lock()
            .unwrap()
            .insert(key(name), Err(LookupError::Failed(message.to_string())));
        self
    }

    /// Every lookup sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn publish_cname(&self, name: &str, target: &str) {
        self.cnames
            .lock()
            .unwrap()
            .insert(key(name), Ok(vec![target.to_string()]));
    }

    pub fn publish_txt(&self, name: &str, records: Vec<Vec<String>>) {
        self.txt.lock().unwrap().insert(key(name), records);
    }

    /// Lookups of any record type made so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    async fn before_lookup(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn lookup_cname(&self, name: &str) -> Result<Vec<String>, LookupError> {
        self.before_lookup().await;
        match self.cnames.lock().unwrap().get(&key(name)) {
            Some(Ok(targets)) if !targets.is_empty() => Ok(targets.clone()),
            Some(Err(e)) => Err(e.clone()),
            _ => Err(LookupError::NoRecords {
                record_type: "CNAME",
            }),
        }
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<Vec<String>>, LookupError> {
        self.before_lookup().await;
        match self.txt.lock().unwrap().get(&key(name)) {
            Some(records) if !records.is_empty() => Ok(records.clone()),
            _ => Err(LookupError::NoRecords { record_type: "TXT" }),
        }
    }

    async fn lookup_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, LookupError> {
        self.before_lookup().await;
        match self.a.lock().unwrap().get(&key(name)) {
            Some(ips) if !ips.is_empty() => Ok(ips.clone()),
            _ => Err(LookupError::NoRecords { record_type: "A" }),
        }
    }
}

// ============================================================================
// Certificate client
// ============================================================================

/// Records every call. When given a certs root, a successful issue mints a
/// real certificate there and revoke deletes it.
pub struct FakeCertificateClient {
    certs: Option<(PathBuf, i32)>,
    issue_output: CommandOutput,
    renew_output: CommandOutput,
    revoke_output: CommandOutput,
    issued: Mutex<Vec<String>>,
    revoked: Mutex<Vec<String>>,
}

impl Default for FakeCertificateClient {
    fn default() -> Self {
        Self {
            certs: None,
            issue_output: CommandOutput::ok("Successfully received certificate."),
            renew_output: CommandOutput::ok("Congratulations, all renewals succeeded."),
            revoke_output: CommandOutput::ok(
                "Congratulations! You have successfully revoked the certificate",
            ),
            issued: Mutex::new(Vec::new()),
            revoked: Mutex::new(Vec::new()),
        }
    }
}

impl FakeCertificateClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issuing_into(mut self, certs_root: &Path, not_after_year: i32) -> Self {
        self.certs = Some((certs_root.to_path_buf(), not_after_year));
        self
    }

    pub fn failing_issue(mut self, output: CommandOutput) -> Self {
        self.issue_output = output;
        self
    }

    pub fn renew_output(mut self, output: CommandOutput) -> Self {
        self.renew_output = output;
        self
    }

    /// Revoke exits with `output` and leaves the certificate files in place.
    pub fn failing_revoke(mut self, output: CommandOutput) -> Self {
        self.revoke_output = output;
        self
    }

    pub fn issued(&self) -> Vec<String> {
        self.issued.lock().unwrap().clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl CertificateClient for FakeCertificateClient {
    async fn issue(&self, domain: &str, _contact_email: &str) -> AppResult<CommandOutput> {
        self.issued.lock().unwrap().push(domain.to_string());
        if self.issue_output.success
            && let Some((root, year)) = &self.certs
        {
            write_test_certificate(root, domain, *year);
        }
        Ok(self.issue_output.clone())
    }

    async fn renew(&self, _domain: &str) -> AppResult<CommandOutput> {
        Ok(self.renew_output.clone())
    }

    async fn revoke(&self, domain: &str) -> AppResult<CommandOutput> {
        self.revoked.lock().unwrap().push(domain.to_string());
        if self.revoke_output.success
            && let Some((root, _)) = &self.certs
        {
            let _ = std::fs::remove_dir_all(root.join(domain));
        }
        Ok(self.revoke_output.clone())
    }
}

// ============================================================================
// Proxy controller
// ============================================================================

#[derive(Default)]
pub struct FakeProxyController {
    test_failure: Mutex<Option<String>>,
    reload_failure: Mutex<Option<String>>,
    tests: AtomicUsize,
    reloads: AtomicUsize,
}

impl FakeProxyController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following config test fail with `stderr`.
    pub fn fail_tests(&self, stderr: &str) {
        *self.test_failure.lock().unwrap() = Some(stderr.to_string());
    }

    pub fn fail_reloads(&self, stderr: &str) {
        *self.reload_failure.lock().unwrap() = Some(stderr.to_string());
    }

    pub fn test_count(&self) -> usize {
        self.tests.load(Ordering::SeqCst)
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyController for FakeProxyController {
    async fn test_config(&self) -> AppResult<CommandOutput> {
        self.tests.fetch_add(1, Ordering::SeqCst);
        Ok(match self.test_failure.lock().unwrap().as_deref() {
            Some(stderr) => CommandOutput::failed(1, stderr),
            None => CommandOutput::ok("nginx: configuration file test is successful"),
        })
    }

    async fn reload(&self) -> AppResult<CommandOutput> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(match self.reload_failure.lock().unwrap().as_deref() {
            Some(stderr) => CommandOutput::failed(1, stderr),
            None => CommandOutput::ok(""),
        })
    }
}
