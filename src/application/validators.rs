use validator::ValidateEmail;

pub const MIN_HOSTNAME_LEN: usize = 3;
pub const MAX_HOSTNAME_LEN: usize = 253;
pub const MAX_LABEL_LEN: usize = 63;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Lowercase, trim and drop a single trailing root dot.
pub fn normalize_hostname(raw: &str) -> String {
    let trimmed = raw.trim().to_ascii_lowercase();
    trimmed.strip_suffix('.').unwrap_or(&trimmed).to_string()
}

/// Normalizes `raw` and checks it against the hostname grammar.
///
/// Rules:
/// - 3-253 characters total
/// - at least two dot-separated labels
/// - each label 1-63 characters of ASCII letters, digits or hyphens
/// - labels never start or end with a hyphen
///
/// On failure the error names the first rule the input breaks.
pub fn validate_hostname(raw: &str) -> Result<String, String> {
    let host = normalize_hostname(raw);

    if host.len() < MIN_HOSTNAME_LEN || host.len() > MAX_HOSTNAME_LEN {
        return Err(format!(
            "hostname must be between {MIN_HOSTNAME_LEN} and {MAX_HOSTNAME_LEN} characters"
        ));
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Err("hostname must contain at least two labels (e.g. shop.example.com)".into());
    }

    for label in labels {
        if label.is_empty() {
            return Err("hostname must not contain empty labels".into());
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(format!(
                "label '{label}' exceeds {MAX_LABEL_LEN} characters"
            ));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(format!(
                "label '{label}' may only contain letters, digits and hyphens"
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!("label '{label}' must not start or end with a hyphen"));
        }
    }

    Ok(host)
}
