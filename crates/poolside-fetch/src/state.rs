//! Observable request state

use crate::error::ErrorInfo;

/// Snapshot of a controller's lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    /// Last successful payload, kept until replaced or reset
    pub data: Option<T>,
    /// Last failure; cleared when a new request starts
    pub error: Option<ErrorInfo>,
    /// True strictly while a request is outstanding
    pub loading: bool,
    /// Last HTTP status observed, success or failure
    pub status_code: Option<u16>,
}

impl<T> RequestState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
            status_code: None,
        }
    }

    pub(crate) fn initial(loading: bool) -> Self {
        Self {
            loading,
            ..Self::idle()
        }
    }

    pub fn is_success(&self) -> bool {
        !self.loading && self.error.is_none() && self.data.is_some()
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::idle()
    }
}
