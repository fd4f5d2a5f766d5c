//! Scripted in-memory transport
//!
//! Every `send` parks until the test answers it, so tests decide the order
//! in which responses resolve. The cancellation token is handed to the test
//! but not honoured: late answers still arrive.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::target::RequestDescriptor;
use crate::transport::{Transport, TransportError, TransportResponse};

type Reply = Result<TransportResponse, TransportError>;

pub struct ScriptedTransport {
    pending: mpsc::UnboundedSender<PendingRequest>,
}

/// A request waiting for the test to answer it
#[derive(Debug)]
pub struct PendingRequest {
    pub descriptor: RequestDescriptor,
    pub cancel: CancellationToken,
    responder: oneshot::Sender<Reply>,
}

impl PendingRequest {
    pub fn respond(self, status: u16, data: Value) {
        let _ = self.responder.send(Ok(TransportResponse::new(status, data)));
    }

    pub fn fail(self, message: impl Into<String>) {
        let _ = self
            .responder
            .send(Err(TransportError::NoResponse(message.into())));
    }

    pub fn abort(self) {
        let _ = self.responder.send(Err(TransportError::Aborted));
    }
}

impl ScriptedTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingRequest>) {
        let (pending, requests) = mpsc::unbounded_channel();
        (Self { pending }, requests)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        descriptor: RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<TransportResponse, TransportError> {
        let (responder, reply) = oneshot::channel();
        self.pending
            .send(PendingRequest {
                descriptor,
                cancel,
                responder,
            })
            .map_err(|_| TransportError::NoResponse("scripted transport closed".to_string()))?;

        reply
            .await
            .unwrap_or_else(|_| Err(TransportError::NoResponse("request dropped".to_string())))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
