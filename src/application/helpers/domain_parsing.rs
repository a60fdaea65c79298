/// Multi-part public suffixes that need special handling when finding the
/// registrable domain.
const MULTI_PART_TLDS: &[&str] = &[
    "co.uk", "com.au", "co.nz", "com.br", "co.jp", "org.uk", "net.au", "co.za",
];

/// Extract the registrable (root) domain from any hostname
/// e.g., "shop.example.com" -> "example.com"
/// e.g., "store.staging.example.co.uk" -> "example.co.uk"
pub fn get_root_domain(hostname: &str) -> String {
    let parts: Vec<&str> = hostname.split('.').collect();
    let hostname_lower = hostname.to_lowercase();

    for tld in MULTI_PART_TLDS {
        if hostname_lower.ends_with(&format!(".{tld}")) && parts.len() >= 3 {
            let tld_parts = tld.split('.').count();
            let domain_start = parts.len() - tld_parts - 1;
            return parts[domain_start..].join(".");
        }
    }

    if parts.len() >= 2 {
        return parts[parts.len() - 2..].join(".");
    }

    hostname.to_string()
}

/// The host label a tenant types into their DNS provider for `hostname`
/// inside its root zone: "shop.example.com" -> "shop", "example.com" -> "@".
pub fn record_host_label(hostname: &str) -> String {
    let root = get_root_domain(hostname);
    match hostname.strip_suffix(&format!(".{root}")) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => "@".to_string(),
    }
}

/// Host label for a record published under `prefix` on `hostname`,
/// e.g. ("_platform-verification", "shop.example.com") -> "_platform-verification.shop".
pub fn prefixed_host_label(prefix: &str, hostname: &str) -> String {
    match record_host_label(hostname).as_str() {
        "@" => prefix.to_string(),
        label => format!("{prefix}.{label}"),
    }
}
