//! Narrow seams to the external systems this service drives.
//!
//! Each port is a trait object so tests can swap the real process/network
//! adapters for in-memory fakes.

use serde::Serialize;

pub mod attempt_limiter;
pub mod certificate_client;
pub mod proxy_controller;
pub mod resolver;

pub use attempt_limiter::{AttemptLimiter, RateDecision, RatePolicy};
pub use certificate_client::CertificateClient;
pub use proxy_controller::ProxyController;
pub use resolver::{LookupError, Resolver};

/// Captured result of an external command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Best single-line summary for user-facing messages: stderr when present,
    /// stdout otherwise.
    pub fn summary(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}
