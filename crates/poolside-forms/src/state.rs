// File: poolside-forms/src/state.rs
// Purpose: Observable snapshot of one form

use std::collections::BTreeMap;

use crate::value::{FieldErrors, FormValues};

/// Error key used for a failed submission
pub const SUBMIT_ERROR_KEY: &str = "submit";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub values: FormValues,
    /// Output of the latest validation pass, plus `submit` after a failed submission
    pub errors: FieldErrors,
    pub touched: BTreeMap<String, bool>,
    /// True strictly while the submit handler runs
    pub is_submitting: bool,
    pub is_valid: bool,
}

impl FormState {
    pub(crate) fn new(values: FormValues, errors: FieldErrors) -> Self {
        Self {
            values,
            is_valid: errors.is_empty(),
            errors,
            touched: BTreeMap::new(),
            is_submitting: false,
        }
    }

    pub(crate) fn set_errors(&mut self, errors: FieldErrors) {
        self.is_valid = errors.is_empty();
        self.errors = errors;
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.get(name).copied().unwrap_or(false)
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Error to display for a field: only once the field has been touched
    pub fn visible_error(&self, name: &str) -> Option<&str> {
        if self.is_touched(name) {
            self.error(name)
        } else {
            None
        }
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.error(SUBMIT_ERROR_KEY)
    }
}
