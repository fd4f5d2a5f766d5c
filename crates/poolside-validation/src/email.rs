//! Email validation functions

/// Common free-mail domains, used to ask coaches for a club address
const PUBLIC_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "mail.com",
    "protonmail.com",
    "yandex.com",
    "zoho.com",
];

/// Validates basic email format
///
/// Checks for:
/// - exactly one '@' with content on both sides
/// - a dotted domain that neither starts nor ends with '.' or '-'
/// - no consecutive dots in the domain
/// - a top-level domain of at least two characters
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if domain.contains('@') {
        return false;
    }

    if local.is_empty() || local.len() > 64 {
        return false;
    }

    if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
        return false;
    }

    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) || domain.contains("..") {
        return false;
    }

    let valid_local = |c: char| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '+');
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local) || !domain.chars().all(valid_domain) {
        return false;
    }

    domain
        .rsplit_once('.')
        .map(|(_, tld)| tld.len() >= 2)
        .unwrap_or(false)
}

/// Checks if the email belongs to a well-known free-mail provider
pub fn is_public_domain(email: &str) -> bool {
    email
        .split_once('@')
        .map(|(_, domain)| PUBLIC_DOMAINS.iter().any(|d| d.eq_ignore_ascii_case(domain)))
        .unwrap_or(false)
}

/// Checks if the email domain is in the blocked list
pub fn is_blocked_domain(email: &str, blocked: &[String]) -> bool {
    email
        .split_once('@')
        .map(|(_, domain)| blocked.iter().any(|b| b.eq_ignore_ascii_case(domain)))
        .unwrap_or(false)
}
