use std::net::Ipv4Addr;

/// Names no tenant may ever claim, regardless of configuration.
const STATIC_BLOCKLIST: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "broadcasthost",
    "ip6-localhost",
    "ip6-loopback",
    "example.com",
    "example.net",
    "example.org",
];

/// Substrings that mark loopback, mDNS or private names.
const RESERVED_TOKENS: &[&str] = &["localhost", ".local", "internal"];

/// Denylist applied to every claimed hostname.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    platform_domain: String,
    extra_blocked: Vec<String>,
}

impl DomainPolicy {
    pub fn new(platform_domain: &str, extra_blocked: Vec<String>) -> Self {
        Self {
            platform_domain: platform_domain.trim_end_matches('.').to_ascii_lowercase(),
            extra_blocked: extra_blocked
                .into_iter()
                .map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn platform_domain(&self) -> &str {
        &self.platform_domain
    }

    /// Returns the reason `host` is not claimable, or `Ok` if it passes.
    /// `host` is expected to be normalized already; matching lowercases again
    /// so callers cannot bypass it with mixed case.
    pub fn check(&self, host: &str) -> Result<(), String> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();

        if host == self.platform_domain {
            return Err("the platform's own domain cannot be claimed".into());
        }
        if host.ends_with(&format!(".{}", self.platform_domain)) {
            return Err(format!(
                "subdomains of {} are reserved for the platform",
                self.platform_domain
            ));
        }
        if host.parse::<Ipv4Addr>().is_ok() {
            return Err("IP addresses cannot be used as a custom domain".into());
        }
        if let Some(token) = RESERVED_TOKENS.iter().find(|t| host.contains(*t)) {
            return Err(format!(
                "loopback, local and internal names are not allowed (matched '{token}')"
            ));
        }
        if STATIC_BLOCKLIST.contains(&host.as_str())
            || self.extra_blocked.iter().any(|b| b == &host)
        {
            return Err("this domain is on the blocked list".into());
        }

        Ok(())
    }
}
