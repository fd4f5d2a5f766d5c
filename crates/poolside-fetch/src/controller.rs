// File: poolside-fetch/src/controller.rs
// Purpose: Own one network operation at a time and publish its lifecycle

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{server_message, RequestError};
use crate::options::{OptionsOverride, RequestOptions};
use crate::state::RequestState;
use crate::target::{RequestTarget, TargetOverride};
use crate::transport::{Transport, TransportError, TransportResponse};

/// Which operation currently has the right to mutate state
struct Ownership {
    generation: u64,
    token: Option<CancellationToken>,
    torn_down: bool,
}

/// Issued to an operation when it starts
struct Ticket {
    generation: u64,
    token: CancellationToken,
}

struct Shared<T> {
    transport: Arc<dyn Transport>,
    target: RequestTarget,
    options: RequestOptions,
    state: watch::Sender<RequestState<T>>,
    ownership: Mutex<Ownership>,
}

impl<T> Shared<T> {
    fn ownership(&self) -> MutexGuard<'_, Ownership> {
        self.ownership.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Supersede whatever is owned and hand out a fresh ticket
    fn begin(&self) -> Option<Ticket> {
        let mut ownership = self.ownership();
        if ownership.torn_down {
            return None;
        }

        if let Some(previous) = ownership.token.take() {
            previous.cancel();
        }
        ownership.generation += 1;
        let token = CancellationToken::new();
        ownership.token = Some(token.clone());

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        tracing::debug!(generation = ownership.generation, url = %self.target.url, "request started");
        Some(Ticket {
            generation: ownership.generation,
            token,
        })
    }

    /// Apply an outcome if its operation is still the current one
    fn finish(&self, generation: u64, outcome: &Result<(u16, T), RequestError>) -> bool
    where
        T: Clone,
    {
        let mut ownership = self.ownership();
        if ownership.torn_down || ownership.generation != generation {
            tracing::trace!(
                generation,
                current = ownership.generation,
                "dropping stale resolution"
            );
            return false;
        }

        match outcome {
            Ok((status, data)) => {
                self.state.send_modify(|state| {
                    state.data = Some(data.clone());
                    state.error = None;
                    state.status_code = Some(*status);
                    state.loading = false;
                });
            }
            Err(RequestError::Cancelled) => {
                // Transport gave up on its own; nothing owned is left running
                ownership.token = None;
                self.state.send_modify(|state| state.loading = false);
                return false;
            }
            Err(error) => {
                self.state.send_modify(|state| {
                    state.error = Some(error.info());
                    if let Some(status) = error.status() {
                        state.status_code = Some(status);
                    }
                    state.loading = false;
                });
            }
        }

        ownership.token = None;
        tracing::debug!(generation, ok = outcome.is_ok(), "request finished");
        true
    }

    /// Stop honouring the owned operation; returns whether one was owned
    fn release(&self, seal: bool) -> bool {
        let mut ownership = self.ownership();
        if seal {
            ownership.torn_down = true;
        }
        ownership.generation += 1;
        match ownership.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Manages one cancellable, re-triggerable request
///
/// Only the most recently started operation may change state. Earlier
/// operations still resolve for whoever awaits them, but with
/// [`RequestError::Cancelled`] and without touching state. Dropping the
/// controller tears it down.
pub struct RequestController<T = Value> {
    shared: Arc<Shared<T>>,
}

impl<T> RequestController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create an idle controller
    pub fn new(transport: Arc<dyn Transport>, target: RequestTarget, options: RequestOptions) -> Self {
        Self::configure(transport, target, options, false)
    }

    /// Create a controller, optionally starting a request right away
    ///
    /// Starting immediately spawns the operation on the current tokio
    /// runtime; its outcome is observed through state. Outside a runtime
    /// nothing is started and the controller stays idle.
    pub fn configure(
        transport: Arc<dyn Transport>,
        target: RequestTarget,
        options: RequestOptions,
        auto_start: bool,
    ) -> Self {
        let runtime = if auto_start {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(error) => {
                    tracing::warn!(%error, url = %target.url, "no tokio runtime, skipping initial request");
                    None
                }
            }
        } else {
            None
        };

        let (state, _) = watch::channel(RequestState::initial(runtime.is_some()));
        let controller = Self {
            shared: Arc::new(Shared {
                transport,
                target,
                options,
                state,
                ownership: Mutex::new(Ownership {
                    generation: 0,
                    token: None,
                    torn_down: false,
                }),
            }),
        };

        if let Some(runtime) = runtime {
            let operation = controller.execute(None, None);
            runtime.spawn(async move {
                if let Err(error) = operation.await {
                    tracing::debug!(%error, "initial request did not complete");
                }
            });
        }

        controller
    }

    /// Start a new operation, superseding any owned one
    ///
    /// The start transition happens before this returns: `loading` is set
    /// and the previous operation is cancelled even if the returned future
    /// is never polled. Failures are published to state and also returned.
    pub fn execute(
        &self,
        target: Option<TargetOverride>,
        options: Option<OptionsOverride>,
    ) -> impl Future<Output = Result<T, RequestError>> + Send + 'static {
        let shared = Arc::clone(&self.shared);
        let target = shared.target.merged(target);
        let options = shared.options.merged(options);
        let ticket = shared.begin();

        async move {
            let Some(ticket) = ticket else {
                return Err(RequestError::Cancelled);
            };

            let descriptor = target.descriptor();
            let sent = tokio::time::timeout(
                options.timeout,
                shared.transport.send(descriptor, ticket.token.clone()),
            )
            .await;

            let outcome = match sent {
                Err(_) => Err(RequestError::Transport {
                    message: format!("request timed out after {:?}", options.timeout),
                }),
                Ok(reply) => classify::<T>(reply, &options),
            };

            if !shared.finish(ticket.generation, &outcome) {
                return Err(RequestError::Cancelled);
            }
            outcome.map(|(_, data)| data)
        }
    }

    /// Re-run the bound request without overrides
    pub fn refetch(&self) -> impl Future<Output = Result<T, RequestError>> + Send + 'static {
        self.execute(None, None)
    }

    /// Cancel the owned operation without starting another
    ///
    /// `loading` returns to false; `error` is left untouched.
    pub fn cancel(&self) {
        if self.shared.ownership().torn_down {
            return;
        }
        if self.shared.release(false) {
            self.shared.state.send_modify(|state| state.loading = false);
            tracing::debug!("request cancelled");
        }
    }

    /// Restore the initial empty state without cancelling or starting anything
    pub fn reset(&self) {
        if self.shared.ownership().torn_down {
            return;
        }
        self.shared.state.send_replace(RequestState::idle());
    }

    /// End the controller's scope: cancel owned work and freeze state
    pub fn teardown(&self) {
        if self.shared.release(true) {
            tracing::debug!("request cancelled by teardown");
        }
    }

    pub fn state(&self) -> RequestState<T> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.shared.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().loading
    }

    pub fn target(&self) -> &RequestTarget {
        &self.shared.target
    }

    pub fn transport_name(&self) -> &'static str {
        self.shared.transport.name()
    }
}

impl<T> Drop for RequestController<T> {
    fn drop(&mut self) {
        self.shared.release(true);
    }
}

fn classify<T: DeserializeOwned>(
    reply: Result<TransportResponse, TransportError>,
    options: &RequestOptions,
) -> Result<(u16, T), RequestError> {
    let response = match reply {
        Ok(response) => response,
        Err(TransportError::Aborted) => return Err(RequestError::Cancelled),
        Err(TransportError::NoResponse(message)) => return Err(RequestError::Transport { message }),
    };

    let TransportResponse { status, data } = response;
    if options.error_status.is_failure(status) {
        return Err(RequestError::Server {
            status,
            message: server_message(status, &data),
            body: data,
        });
    }

    serde_json::from_value(data)
        .map(|data| (status, data))
        .map_err(|e| RequestError::Decode {
            status,
            message: e.to_string(),
        })
}
