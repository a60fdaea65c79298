use std::time::Duration;

use async_trait::async_trait;

use crate::app_error::{AppError, AppResult, ExternalKind};
use crate::application::ports::{CommandOutput, ProxyController};
use crate::infra::process::{run_command, split_command_line};

/// Controls the local nginx: `nginx -t` for config tests and the configured
/// service-manager command for reloads.
pub struct NginxController {
    binary: String,
    reload_program: String,
    reload_args: Vec<String>,
    timeout: Duration,
}

impl NginxController {
    pub fn new(binary: impl Into<String>, reload_command: &str, timeout: Duration) -> AppResult<Self> {
        let (reload_program, reload_args) = split_command_line(reload_command)
            .ok_or_else(|| AppError::InvalidInput("proxy reload command is empty".into()))?;
        Ok(Self {
            binary: binary.into(),
            reload_program,
            reload_args,
            timeout,
        })
    }
}

#[async_trait]
impl ProxyController for NginxController {
    async fn test_config(&self) -> AppResult<CommandOutput> {
        run_command(ExternalKind::ProxyConfigTest, &self.binary, &["-t"], self.timeout).await
    }

    async fn reload(&self) -> AppResult<CommandOutput> {
        let args: Vec<&str> = self.reload_args.iter().map(String::as_str).collect();
        run_command(
            ExternalKind::ProxyReload,
            &self.reload_program,
            &args,
            self.timeout,
        )
        .await
    }
}
