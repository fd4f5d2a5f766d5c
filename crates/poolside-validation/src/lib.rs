//! Poolside Validation
//!
//! Pure single-field validators used by the form engine. Every check is a
//! plain function of one value: `None` means valid, `Some(message)` carries a
//! human-readable failure.
//!
//! ```
//! use poolside_validation::{compose_validators, email, required};
//!
//! let rule = compose_validators(vec![required("Email is required"), email()]);
//! assert_eq!(rule(""), Some("Email is required".to_string()));
//! assert_eq!(rule("swimmer@club"), Some("Enter a valid email address".to_string()));
//! assert_eq!(rule("swimmer@club.org"), None);
//! ```

pub mod email;
pub mod password;
pub mod rules;
pub mod string;

pub use email::{is_blocked_domain, is_public_domain, is_valid_email};
pub use password::{validate_password, PasswordPattern};
pub use rules::{
    check, compose_validators, email, length, matches, max_length, min_length, password_strength,
    pattern, required, Rule,
};
pub use string::{validate_length, validate_max_length, validate_min_length};
