//! Password strength validation

/// Password strength patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordPattern {
    /// 6+ characters minimum
    Basic,
    /// 8+ chars with uppercase, lowercase, and digit
    Medium,
    /// 8+ chars with uppercase, lowercase, digit, and special character
    Strong,
}

impl PasswordPattern {
    /// Parse a password pattern from its config name
    ///
    /// ```
    /// use poolside_validation::PasswordPattern;
    /// assert_eq!(PasswordPattern::parse("basic"), Some(PasswordPattern::Basic));
    /// assert_eq!(PasswordPattern::parse("strong"), Some(PasswordPattern::Strong));
    /// assert_eq!(PasswordPattern::parse("paranoid"), None);
    /// ```
    pub fn parse(pattern: &str) -> Option<Self> {
        match pattern {
            "basic" => Some(PasswordPattern::Basic),
            "medium" => Some(PasswordPattern::Medium),
            "strong" => Some(PasswordPattern::Strong),
            _ => None,
        }
    }
}

const SPECIAL_CHARS: &[char] = &[
    '@', '$', '!', '%', '*', '?', '&', '#', '-', '_', '+', '=', '.', ',',
];

/// Validates a password against a strength pattern
///
/// Checks run in a fixed order and the first failing one wins, so the
/// message always points at the most basic missing property.
pub fn validate_password(password: &str, pattern: PasswordPattern) -> Result<(), String> {
    let long_enough = |min: usize| password.chars().count() >= min;
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| SPECIAL_CHARS.contains(&c));

    let checks: Vec<(bool, &str)> = match pattern {
        PasswordPattern::Basic => vec![(long_enough(6), "Password must be at least 6 characters")],
        PasswordPattern::Medium => vec![
            (long_enough(8), "Password must be at least 8 characters"),
            (has_upper, "Password must contain an uppercase letter"),
            (has_lower, "Password must contain a lowercase letter"),
            (has_digit, "Password must contain a digit"),
        ],
        PasswordPattern::Strong => vec![
            (long_enough(8), "Password must be at least 8 characters"),
            (has_upper, "Password must contain an uppercase letter"),
            (has_lower, "Password must contain a lowercase letter"),
            (has_digit, "Password must contain a digit"),
            (
                has_special,
                "Password must contain a special character (@$!%*?&#-_+=.,)",
            ),
        ],
    };

    checks
        .iter()
        .find(|(valid, _)| !valid)
        .map(|(_, msg)| Err(msg.to_string()))
        .unwrap_or(Ok(()))
}
