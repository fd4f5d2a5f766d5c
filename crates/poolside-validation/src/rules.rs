//! Composable field rules
//!
//! A [`Rule`] is a pure check of one field's text. Rules other than
//! [`required`] accept an empty value, so optional fields stay valid until
//! the user types something.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::email::is_valid_email;
use crate::password::{validate_password, PasswordPattern};
use crate::string::{validate_length, validate_max_length, validate_min_length};

/// A single-field check: `None` when valid, otherwise the message to show
pub type Rule = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

static REGEX_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Fails when the value is empty or whitespace only
pub fn required(message: impl Into<String>) -> Rule {
    let message = message.into();
    Arc::new(move |value| value.trim().is_empty().then(|| message.clone()))
}

/// Character count must fall within `min..=max`
pub fn length(min: usize, max: usize) -> Rule {
    Arc::new(move |value| {
        if value.is_empty() {
            return None;
        }
        validate_length(value, min, max).err()
    })
}

pub fn min_length(min: usize) -> Rule {
    Arc::new(move |value| {
        if value.is_empty() {
            return None;
        }
        validate_min_length(value, min).err()
    })
}

pub fn max_length(max: usize) -> Rule {
    Arc::new(move |value| validate_max_length(value, max).err())
}

/// Value must equal `expected`, e.g. a password confirmation
pub fn matches(expected: impl Into<String>, message: impl Into<String>) -> Rule {
    let expected = expected.into();
    let message = message.into();
    Arc::new(move |value| (value != expected).then(|| message.clone()))
}

pub fn email() -> Rule {
    Arc::new(|value| {
        if value.is_empty() || is_valid_email(value) {
            None
        } else {
            Some("Enter a valid email address".to_string())
        }
    })
}

pub fn password_strength(pattern: PasswordPattern) -> Rule {
    Arc::new(move |value| {
        if value.is_empty() {
            return None;
        }
        validate_password(value, pattern).err()
    })
}

/// Value must match a regular expression
///
/// Compiled expressions are cached by source so re-mounting a form does not
/// recompile them.
pub fn pattern(source: &str, message: impl Into<String>) -> Result<Rule, regex::Error> {
    let regex = {
        let mut cache = REGEX_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        match cache.get(source) {
            Some(regex) => regex.clone(),
            None => {
                let regex = Regex::new(source)?;
                cache.insert(source.to_string(), regex.clone());
                regex
            }
        }
    };
    let message = message.into();

    Ok(Arc::new(move |value| {
        if value.is_empty() || regex.is_match(value) {
            None
        } else {
            Some(message.clone())
        }
    }))
}

/// Runs `rules` in order and returns the first failure message
pub fn check(rules: &[Rule], value: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule(value))
}

/// Combines rules into one that short-circuits on the first failure
///
/// Order matters: when several rules fail at once, the earliest one's
/// message is reported.
pub fn compose_validators(rules: impl IntoIterator<Item = Rule>) -> Rule {
    let rules: Vec<Rule> = rules.into_iter().collect();
    Arc::new(move |value| check(&rules, value))
}
