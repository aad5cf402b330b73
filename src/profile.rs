// Profile name derivation

/// Normalize an account display name into a profile name segment:
/// lowercase, trimmed, spaces to hyphens, anything outside `[a-z0-9-]` dropped.
pub fn sanitize_account_name(account_name: &str) -> String {
    account_name
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// `<prefix>-<sanitized name>`, or just the sanitized name without a prefix
pub fn profile_name(prefix: Option<&str>, account_name: &str) -> String {
    let name = sanitize_account_name(account_name);
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}-{}", prefix, name),
        None => name,
    }
}
