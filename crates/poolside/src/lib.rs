//! # Poolside
//!
//! Client core for the Poolside swim-training application. This crate
//! gathers the component crates and adds `poolside.toml` configuration:
//!
//! - [`fetch`]: one cancellable, re-triggerable request per controller,
//!   plus the retry combinator
//! - [`forms`]: form values, validation and guarded submission
//! - [`storage`]: persistent values shared across contexts
//! - [`validation`]: single-field validators
//!
//! ```rust,ignore
//! use poolside::prelude::*;
//!
//! let config = PoolsideConfig::load_default()?;
//! let transport = Arc::new(config.request.transport()?);
//! let plans = RequestController::<Vec<Plan>>::configure(
//!     transport,
//!     config.request.target("plans"),
//!     config.request.to_options(),
//!     true,
//! );
//! ```

pub mod config;

pub use poolside_fetch as fetch;
pub use poolside_forms as forms;
pub use poolside_storage as storage;
pub use poolside_validation as validation;

pub use config::{PoolsideConfig, RequestConfig, RetryConfig};

pub mod prelude {
    pub use crate::config::PoolsideConfig;
    pub use poolside_fetch::{
        with_retry, RequestController, RequestError, RequestOptions, RequestState,
        RequestTarget, RetryPolicy, TargetOverride, Transport,
    };
    pub use poolside_forms::{
        submit_handler, FieldInput, FieldRules, FormConfig, FormEngine, FormValues,
        SubmitOutcome,
    };
    pub use poolside_storage::{PersistentCell, StorageContext, StorageHub};
    pub use std::sync::Arc;
}
