use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::app_error::{AppError, AppResult, ExternalKind};
use crate::application::ports::CommandOutput;

/// Run `program` with `args`, capturing output.
///
/// A non-zero exit is still `Ok`; the caller inspects `CommandOutput::success`.
/// Spawn failures and timeouts are `ExternalFailure` of `kind`. A timed-out
/// child is killed.
pub async fn run_command(
    kind: ExternalKind,
    program: &str,
    args: &[&str],
    limit: Duration,
) -> AppResult<CommandOutput> {
    debug!(program = %program, args = ?args, "Running external command");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::external(kind, format!("failed to start {program}: {e}")))?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(AppError::external(
                kind,
                format!("failed waiting for {program}: {e}"),
            ));
        }
        Err(_) => {
            warn!(program = %program, timeout_secs = limit.as_secs(), "External command timed out");
            return Err(AppError::external(
                kind,
                format!("{program} timed out after {}s", limit.as_secs()),
            ));
        }
    };

    let result = CommandOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !result.success {
        warn!(
            program = %program,
            exit_code = ?result.exit_code,
            stderr = %result.stderr.trim(),
            "External command exited with failure"
        );
    }
    Ok(result)
}

/// Split a configured command line ("systemctl reload nginx") into program and
/// arguments.
pub fn split_command_line(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_of_successful_command() {
        let output = run_command(
            ExternalKind::ProxyReload,
            "sh",
            &["-c", "echo hello"],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let output = run_command(
            ExternalKind::ProxyConfigTest,
            "sh",
            &["-c", "echo broken >&2; exit 3"],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.summary(), "broken");
    }

    #[tokio::test]
    async fn missing_binary_is_an_external_failure() {
        let err = run_command(
            ExternalKind::CertificateClient,
            "/nonexistent/certbot",
            &[],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::ExternalFailure {
                kind: ExternalKind::CertificateClient,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let err = run_command(
            ExternalKind::ProxyReload,
            "sleep",
            &["5"],
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn command_lines_are_split_on_whitespace() {
        let (program, args) = split_command_line("systemctl  reload nginx").unwrap();
        assert_eq!(program, "systemctl");
        assert_eq!(args, vec!["reload", "nginx"]);
        assert!(split_command_line("   ").is_none());
    }
}
