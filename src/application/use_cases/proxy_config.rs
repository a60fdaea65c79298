use std::fmt::Write as _;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult, ExternalKind};
use crate::application::ports::{CommandOutput, ProxyController};
use crate::application::use_cases::certificates::CertPaths;

/// Mode applied to generated site files: owner-writable, world-readable so the
/// proxy workers can load them.
const SITE_FILE_MODE: u32 = 0o644;

const STATIC_ASSET_PATTERN: &str =
    r"\.(?:css|js|mjs|map|png|jpe?g|gif|ico|svg|webp|avif|woff2?|ttf|eot)$";

const GZIP_TYPES: &str = "text/plain text/css text/xml application/json application/javascript application/xml application/rss+xml image/svg+xml";

/// Inputs for one tenant's virtual host.
#[derive(Debug, Clone)]
pub struct SiteSpec<'a> {
    pub domain: &'a str,
    pub tenant_slug: &'a str,
    pub upstream_host: &'a str,
    pub upstream_port: u16,
    pub acme_webroot: &'a Path,
    /// `None` renders the HTTP-only variant.
    pub cert_paths: Option<&'a CertPaths>,
}

/// Upstream block name for a tenant. Deterministic so regenerated configs only
/// differ in the timestamp header.
pub fn upstream_name(tenant_slug: &str) -> String {
    format!("tenant_{}", tenant_slug.replace('-', "_"))
}

fn push_proxy_headers(out: &mut String, upstream: &str, indent: &str) {
    let _ = writeln!(out, "{indent}proxy_pass http://{upstream};");
    let _ = writeln!(out, "{indent}proxy_http_version 1.1;");
    let _ = writeln!(out, "{indent}proxy_set_header Connection \"\";");
    let _ = writeln!(out, "{indent}proxy_set_header Host $host;");
    let _ = writeln!(out, "{indent}proxy_set_header X-Real-IP $remote_addr;");
    let _ = writeln!(out, "{indent}proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;");
    let _ = writeln!(out, "{indent}proxy_set_header X-Forwarded-Proto $scheme;");
    let _ = writeln!(out, "{indent}proxy_set_header X-Forwarded-Host $host;");
}

fn push_acme_location(out: &mut String, webroot: &Path) {
    out.push_str("    location ^~ /.well-known/acme-challenge/ {\n");
    let _ = writeln!(out, "        root {};", webroot.display());
    out.push_str("        default_type \"text/plain\";\n");
    out.push_str("    }\n");
}

/// Upstream port recorded in a previously rendered config.
pub fn configured_upstream_port(config_text: &str) -> Option<u16> {
    config_text
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("server ")?.strip_suffix(';'))
        .and_then(|addr| addr.rsplit_once(':'))
        .and_then(|(_, port)| port.parse().ok())
}

/// Render the nginx virtual host for a tenant domain.
pub fn render_site_config(site: &SiteSpec<'_>, generated_at: DateTime<Utc>) -> String {
    let upstream = upstream_name(site.tenant_slug);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# Managed by storefront-domains for tenant '{}'. Manual edits are overwritten.",
        site.tenant_slug
    );
    let _ = writeln!(out, "# Generated at {}", generated_at.to_rfc3339());
    out.push('\n');

    let _ = writeln!(out, "upstream {upstream} {{");
    let _ = writeln!(out, "    server {}:{};", site.upstream_host, site.upstream_port);
    out.push_str("    keepalive 32;\n");
    out.push_str("}\n\n");

    // Plain HTTP listener.
    out.push_str("server {\n");
    out.push_str("    listen 80;\n");
    out.push_str("    listen [::]:80;\n");
    let _ = writeln!(out, "    server_name {};", site.domain);
    out.push('\n');
    push_acme_location(&mut out, site.acme_webroot);
    out.push('\n');
    out.push_str("    location / {\n");
    match site.cert_paths {
        Some(_) => out.push_str("        return 301 https://$host$request_uri;\n"),
        None => push_proxy_headers(&mut out, &upstream, "        "),
    }
    out.push_str("    }\n");
    out.push_str("}\n");

    let Some(certs) = site.cert_paths else {
        return out;
    };

    out.push('\n');
    out.push_str("server {\n");
    out.push_str("    listen 443 ssl;\n");
    out.push_str("    listen [::]:443 ssl;\n");
    out.push_str("    http2 on;\n");
    let _ = writeln!(out, "    server_name {};", site.domain);
    out.push('\n');
    let _ = writeln!(out, "    ssl_certificate {};", certs.fullchain.display());
    let _ = writeln!(out, "    ssl_certificate_key {};", certs.privkey.display());
    let _ = writeln!(out, "    ssl_trusted_certificate {};", certs.chain.display());
    out.push_str("    ssl_protocols TLSv1.2 TLSv1.3;\n");
    out.push_str("    ssl_prefer_server_ciphers off;\n");
    out.push_str("    ssl_session_cache shared:SSL:10m;\n");
    out.push_str("    ssl_session_timeout 1d;\n");
    out.push('\n');
    out.push_str("    gzip on;\n");
    out.push_str("    gzip_vary on;\n");
    out.push_str("    gzip_proxied any;\n");
    out.push_str("    gzip_comp_level 6;\n");
    let _ = writeln!(out, "    gzip_types {GZIP_TYPES};");
    out.push('\n');
    out.push_str("    client_max_body_size 25m;\n");
    out.push('\n');

    let _ = writeln!(out, "    location ~* {STATIC_ASSET_PATTERN} {{");
    push_proxy_headers(&mut out, &upstream, "        ");
    out.push_str("        expires 30d;\n");
    out.push_str("        add_header Cache-Control \"public, max-age=2592000, immutable\";\n");
    out.push_str("        add_header Strict-Transport-Security \"max-age=31536000\" always;\n");
    out.push_str("    }\n\n");

    out.push_str("    location / {\n");
    push_proxy_headers(&mut out, &upstream, "        ");
    out.push_str("        add_header Cache-Control \"no-cache\";\n");
    out.push_str("        add_header Strict-Transport-Security \"max-age=31536000\" always;\n");
    out.push_str("    }\n");
    out.push_str("}\n");

    out
}

/// Where a site config landed after a successful write.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenConfig {
    pub available_path: PathBuf,
    pub enabled_path: PathBuf,
    pub test_output: CommandOutput,
}

/// Filesystem state to restore if a write has to be undone.
struct RollbackPlan {
    previous_contents: Option<Vec<u8>>,
    created_link: bool,
}

/// Owns the proxy's `sites-available` / `sites-enabled` directories.
pub struct ProxyConfigManager {
    controller: Arc<dyn ProxyController>,
    sites_available: PathBuf,
    sites_enabled: PathBuf,
}

fn fs_error(action: &str, path: &Path, e: std::io::Error) -> AppError {
    AppError::external(
        ExternalKind::Filesystem,
        format!("failed to {action} {}: {e}", path.display()),
    )
}

async fn remove_if_present(path: &Path) -> AppResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_error("remove", path, e)),
    }
}

impl ProxyConfigManager {
    pub fn new(
        controller: Arc<dyn ProxyController>,
        sites_available: impl Into<PathBuf>,
        sites_enabled: impl Into<PathBuf>,
    ) -> Self {
        Self {
            controller,
            sites_available: sites_available.into(),
            sites_enabled: sites_enabled.into(),
        }
    }

    pub fn available_path(&self, domain: &str) -> PathBuf {
        self.sites_available.join(format!("{domain}.conf"))
    }

    pub fn enabled_path(&self, domain: &str) -> PathBuf {
        self.sites_enabled.join(format!("{domain}.conf"))
    }

    pub async fn exists(&self, domain: &str) -> bool {
        matches!(
            tokio::fs::try_exists(self.available_path(domain)).await,
            Ok(true)
        )
    }

    pub async fn read(&self, domain: &str) -> AppResult<Option<String>> {
        let path = self.available_path(domain);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(fs_error("read", &path, e)),
        }
    }

    /// Install `config_text` for `domain`, enable it and run the proxy's config
    /// test. A failing test undoes everything this call changed on disk.
    #[instrument(skip(self, config_text))]
    pub async fn write(&self, domain: &str, config_text: &str) -> AppResult<WrittenConfig> {
        let available = self.available_path(domain);
        let enabled = self.enabled_path(domain);

        for dir in [&self.sites_available, &self.sites_enabled] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| fs_error("create", dir, e))?;
        }

        let previous_contents = match tokio::fs::read(&available).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(fs_error("read", &available, e)),
        };

        // Stage next to the target so the rename stays on one filesystem.
        let staged = self
            .sites_available
            .join(format!(".{domain}.conf.{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = self.stage(&staged, &available, config_text).await {
            let _ = remove_if_present(&staged).await;
            return Err(e);
        }

        let link = match tokio::fs::symlink_metadata(&enabled).await {
            Ok(_) => Ok(false),
            Err(e) if e.kind() == ErrorKind::NotFound => tokio::fs::symlink(&available, &enabled)
                .await
                .map(|_| true)
                .map_err(|e| fs_error("link", &enabled, e)),
            Err(e) => Err(fs_error("inspect", &enabled, e)),
        };

        let created_link = match link {
            Ok(created) => created,
            Err(e) => {
                let plan = RollbackPlan {
                    previous_contents,
                    created_link: false,
                };
                self.rollback(domain, plan).await;
                return Err(e);
            }
        };

        let plan = RollbackPlan {
            previous_contents,
            created_link,
        };

        let test_output = match self.controller.test_config().await {
            Ok(output) => output,
            Err(e) => {
                self.rollback(domain, plan).await;
                return Err(e);
            }
        };

        if !test_output.success {
            warn!(domain = %domain, stderr = %test_output.stderr, "Proxy config test failed, rolling back");
            self.rollback(domain, plan).await;
            return Err(AppError::external_with_output(
                ExternalKind::ProxyConfigTest,
                format!("Proxy configuration test failed: {}", test_output.summary()),
                test_output,
            ));
        }

        info!(domain = %domain, path = %available.display(), "Proxy config written");
        Ok(WrittenConfig {
            available_path: available,
            enabled_path: enabled,
            test_output,
        })
    }

    async fn stage(&self, staged: &Path, target: &Path, config_text: &str) -> AppResult<()> {
        tokio::fs::write(staged, config_text)
            .await
            .map_err(|e| fs_error("write", staged, e))?;
        tokio::fs::set_permissions(staged, std::fs::Permissions::from_mode(SITE_FILE_MODE))
            .await
            .map_err(|e| fs_error("chmod", staged, e))?;
        tokio::fs::rename(staged, target)
            .await
            .map_err(|e| fs_error("move", target, e))
    }

    async fn rollback(&self, domain: &str, plan: RollbackPlan) {
        let available = self.available_path(domain);
        let enabled = self.enabled_path(domain);

        if plan.created_link
            && let Err(e) = remove_if_present(&enabled).await
        {
            warn!(domain = %domain, error = %e, "Rollback could not remove enabled link");
        }

        let restored = match plan.previous_contents {
            Some(previous) => tokio::fs::write(&available, previous)
                .await
                .map_err(|e| fs_error("restore", &available, e)),
            None => remove_if_present(&available).await,
        };
        if let Err(e) = restored {
            warn!(domain = %domain, error = %e, "Rollback could not restore site config");
        }
    }

    /// Re-test the whole proxy config and reload the running process.
    ///
    /// Errors use `ExternalKind::ProxyReload` so callers can tell the config
    /// is on disk but not yet serving.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> AppResult<CommandOutput> {
        let test = self.controller.test_config().await.map_err(|e| {
            AppError::external(
                ExternalKind::ProxyReload,
                format!("Configuration is on disk but not yet live; could not test proxy config: {e}"),
            )
        })?;
        if !test.success {
            return Err(AppError::external_with_output(
                ExternalKind::ProxyReload,
                format!(
                    "Configuration is on disk but not yet live; proxy config test failed before reload: {}",
                    test.summary()
                ),
                test,
            ));
        }

        let output = self.controller.reload().await.map_err(|e| {
            AppError::external(
                ExternalKind::ProxyReload,
                format!("Configuration is on disk but not yet live; manual reload may be required: {e}"),
            )
        })?;
        if !output.success {
            return Err(AppError::external_with_output(
                ExternalKind::ProxyReload,
                format!(
                    "Configuration is on disk but not yet live; manual reload may be required: {}",
                    output.summary()
                ),
                output,
            ));
        }

        info!("Proxy reloaded");
        Ok(output)
    }

    /// Delete the enabled link and the site file, then re-test. Reloading is
    /// left to the caller.
    #[instrument(skip(self))]
    pub async fn remove(&self, domain: &str) -> AppResult<CommandOutput> {
        remove_if_present(&self.enabled_path(domain)).await?;
        remove_if_present(&self.available_path(domain)).await?;

        let test = self.controller.test_config().await?;
        if !test.success {
            warn!(domain = %domain, stderr = %test.stderr, "Proxy config test failing after site removal");
        }
        Ok(test)
    }
}
