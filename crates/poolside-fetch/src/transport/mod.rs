//! Abstract transport consumed by request controllers

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::target::RequestDescriptor;

#[cfg(feature = "http")]
pub mod http;

/// A response that made it back, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub data: Value,
}

impl TransportResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }
}

/// Failures where no response was received
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Network failure, DNS error, refused connection, ...
    #[error("no response: {0}")]
    NoResponse(String),

    /// The cancellation token fired before a response arrived
    #[error("request aborted")]
    Aborted,
}

/// Trait for request transports
///
/// Implementations return every received response, error statuses
/// included; classification belongs to the controller. The cancellation
/// token should be honoured when the underlying client can abort.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        descriptor: RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<TransportResponse, TransportError>;

    /// Transport name, for logs
    fn name(&self) -> &'static str;
}
