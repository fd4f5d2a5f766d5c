//! # poolside-forms
//!
//! Form state for Poolside clients. A [`FormEngine`] owns field values,
//! runs a caller-supplied validator on every change, tracks which fields
//! were touched and guards the asynchronous submit path.
//!
//! ```rust,ignore
//! use poolside_forms::{submit_handler, FieldInput, FieldRules, FormConfig, FormEngine, FormValues};
//! use poolside_validation::{required, length};
//!
//! let engine = FormEngine::configure(
//!     FormValues::new().with("name", "").with("distance", ""),
//!     submit_handler(|values| async move { api.create_workout(values.decode()?).await }),
//!     FormConfig::default().with_validator(
//!         FieldRules::new()
//!             .field("name", [required("Name is required"), length(2, 80)])
//!             .into_validator(),
//!     ),
//! );
//!
//! engine.on_field_change("name", FieldInput::text("Threshold 10x100"));
//! engine.on_field_blur("name");
//! engine.submit(None).await;
//! ```

pub mod engine;
pub mod rules;
pub mod state;
pub mod value;

pub use engine::{
    async_validator, submit_handler, validator, AsyncValidator, FormConfig, FormEngine,
    SubmitEvent, SubmitHandler, SubmitOutcome, Validator,
};
pub use rules::FieldRules;
pub use state::{FormState, SUBMIT_ERROR_KEY};
pub use value::{FieldErrors, FieldInput, FieldKind, FieldValue, FileRef, FormValues};
