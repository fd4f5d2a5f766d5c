//! Per-field rule sets that produce a form [`Validator`]

use poolside_validation::{compose_validators, Rule};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::Validator;
use crate::value::{FieldErrors, FormValues};

#[derive(Clone)]
struct Confirmation {
    field: String,
    other: String,
    message: String,
}

/// Maps field names to composed single-field rules
///
/// ```
/// use poolside_forms::FieldRules;
/// use poolside_validation::{email, required};
///
/// let validate = FieldRules::new()
///     .field("email", [required("Email is required"), email()])
///     .into_validator();
/// ```
#[derive(Clone, Default)]
pub struct FieldRules {
    rules: BTreeMap<String, Rule>,
    confirmations: Vec<Confirmation>,
}

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rules for a field; they run in order and the first failure wins
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.insert(name.into(), compose_validators(rules));
        self
    }

    /// Require `field` to equal `other`, checked after `field`'s own rules pass
    pub fn confirm(
        mut self,
        field: impl Into<String>,
        other: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.confirmations.push(Confirmation {
            field: field.into(),
            other: other.into(),
            message: message.into(),
        });
        self
    }

    pub fn check(&self, values: &FormValues) -> FieldErrors {
        let mut errors = FieldErrors::new();

        for (name, rule) in &self.rules {
            if let Some(message) = rule(values.text(name).as_ref()) {
                errors.insert(name.clone(), message);
            }
        }

        for confirmation in &self.confirmations {
            if errors.contains_key(&confirmation.field) {
                continue;
            }
            if values.text(&confirmation.field) != values.text(&confirmation.other) {
                errors.insert(confirmation.field.clone(), confirmation.message.clone());
            }
        }

        errors
    }

    pub fn into_validator(self) -> Validator {
        Arc::new(move |values| self.check(values))
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("fields", &self.rules.keys().collect::<Vec<_>>())
            .field("confirmations", &self.confirmations.len())
            .finish()
    }
}
