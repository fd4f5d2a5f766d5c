//! Controller options and status classification

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on an operation's outstanding duration
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decides which received statuses count as a server failure
#[derive(Clone)]
pub enum StatusPolicy {
    /// Any status at or above the threshold is a failure
    Threshold(u16),
    /// Caller-defined classification; returns true for failures
    Custom(Arc<dyn Fn(u16) -> bool + Send + Sync>),
}

impl StatusPolicy {
    pub fn threshold(from: u16) -> Self {
        StatusPolicy::Threshold(from)
    }

    pub fn custom(is_failure: impl Fn(u16) -> bool + Send + Sync + 'static) -> Self {
        StatusPolicy::Custom(Arc::new(is_failure))
    }

    pub fn is_failure(&self, status: u16) -> bool {
        match self {
            StatusPolicy::Threshold(from) => status >= *from,
            StatusPolicy::Custom(is_failure) => is_failure(status),
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        StatusPolicy::Threshold(400)
    }
}

impl fmt::Debug for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::Threshold(from) => f.debug_tuple("Threshold").field(from).finish(),
            StatusPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options bag bound to a controller
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub timeout: Duration,
    pub error_status: StatusPolicy,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            error_status: StatusPolicy::default(),
        }
    }
}

impl RequestOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_error_status(mut self, policy: StatusPolicy) -> Self {
        self.error_status = policy;
        self
    }

    pub fn merged(&self, overrides: Option<OptionsOverride>) -> RequestOptions {
        let mut options = self.clone();
        if let Some(overrides) = overrides {
            if let Some(timeout) = overrides.timeout {
                options.timeout = timeout;
            }
            if let Some(policy) = overrides.error_status {
                options.error_status = policy;
            }
        }
        options
    }
}

/// Per-call changes to the bound options
#[derive(Debug, Clone, Default)]
pub struct OptionsOverride {
    pub timeout: Option<Duration>,
    pub error_status: Option<StatusPolicy>,
}

impl OptionsOverride {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}
