//! # poolside-fetch
//!
//! Request lifecycle management for Poolside clients: one owned, cancellable
//! network operation per controller, observable state, and a fixed-delay
//! retry combinator.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use poolside_fetch::{HttpTransport, RequestController, RequestOptions, RequestTarget};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(HttpTransport::with_base_url("https://api.poolside.example")?);
//! let workouts = RequestController::<Vec<Workout>>::configure(
//!     transport,
//!     RequestTarget::get("/api/workouts"),
//!     RequestOptions::default(),
//!     true, // start immediately
//! );
//!
//! let mut updates = workouts.subscribe();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     render(state);
//! }
//! ```

pub mod controller;
pub mod error;
pub mod options;
pub mod retry;
pub mod state;
pub mod target;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use controller::RequestController;
pub use error::{ErrorInfo, RequestError};
pub use options::{OptionsOverride, RequestOptions, StatusPolicy};
pub use retry::{with_retry, RetryPolicy};
pub use state::RequestState;
pub use target::{AuthToken, Method, RequestDescriptor, RequestTarget, TargetOverride};
pub use transport::{Transport, TransportError, TransportResponse};

#[cfg(feature = "http")]
pub use transport::http::HttpTransport;

pub use tokio_util::sync::CancellationToken;
