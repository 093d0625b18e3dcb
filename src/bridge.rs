//! Thread-affinity boundary between worker threads and the presentation loop.
//!
//! The bridge installs the coordinator's delivery callback as an unbounded
//! channel sender, so an `ask` on any worker thread only enqueues its request
//! and returns. The single presentation loop drains the receiver, dispatches
//! each request to the handler registered for its type, and routes the
//! operator's answer back through [`Responder`].
//!
//! Handler logic never runs on a worker thread; everything human-facing
//! happens wherever the owner of this bridge pumps it.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::coordinator::Coordinator;
use crate::error::InputError;
use crate::provider::InputProvider;
use crate::types::{InputRequest, InputResponse};

// ---------------------------------------------------------------------------
// PresentationHandler trait
// ---------------------------------------------------------------------------

/// Per-type presentation component that renders one request and reports the
/// operator's answer.
///
/// Contract: `handle` must call [`Responder::send`] exactly once, with the
/// `request_id` it received, and must only touch presentation state from the
/// presentation loop.
pub trait PresentationHandler: Send {
    /// Type id this handler renders. Must match its paired provider.
    fn type_id(&self) -> &'static str;

    /// Show the request and eventually report a response.
    fn handle(&mut self, request: InputRequest, responder: &Responder);
}

// ---------------------------------------------------------------------------
// Responder
// ---------------------------------------------------------------------------

/// Cheap handle handlers use to send the operator's answer back.
#[derive(Clone)]
pub struct Responder {
    coordinator: Arc<Coordinator>,
}

impl Responder {
    /// Build and forward a response for `request_id`.
    ///
    /// `data` must be `None` when `cancelled` is true.
    pub fn send(&self, request_id: &str, data: Option<Value>, cancelled: bool) {
        let response = match data {
            Some(data) if !cancelled => InputResponse::answered(request_id, data),
            _ => InputResponse::cancelled(request_id),
        };
        self.coordinator.set_response(response);
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// Pairs providers with presentation handlers and pumps queued requests.
pub struct Bridge {
    coordinator: Arc<Coordinator>,
    handlers: HashMap<String, Box<dyn PresentationHandler>>,
    requests: mpsc::UnboundedReceiver<InputRequest>,
}

impl Bridge {
    /// Wire a bridge to `coordinator`, installing its delivery callback.
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel::<InputRequest>();
        coordinator.set_deliver(move |request| {
            // Receiver gone means the presentation loop shut down; the request
            // is unanswerable either way, so the send result is moot.
            let _ = request_tx.send(request);
        });
        Self {
            coordinator,
            handlers: HashMap::new(),
            requests: request_rx,
        }
    }

    /// Register a provider/handler pair for one input type.
    ///
    /// Pairing is atomic: on a type-id mismatch neither the coordinator
    /// registry nor the handler table changes.
    pub fn register_input_type(
        &mut self,
        provider: Arc<dyn InputProvider>,
        handler: Box<dyn PresentationHandler>,
    ) -> Result<(), InputError> {
        if provider.type_id() != handler.type_id() {
            return Err(InputError::HandlerMismatch {
                provider: provider.type_id().to_string(),
                handler: handler.type_id().to_string(),
            });
        }
        self.coordinator.register_provider(provider)?;
        self.handlers.insert(handler.type_id().to_string(), handler);
        Ok(())
    }

    /// Responder handle for handlers and tests.
    pub fn responder(&self) -> Responder {
        Responder {
            coordinator: Arc::clone(&self.coordinator),
        }
    }

    /// True when a handler is registered for `type_id`.
    pub fn has_handler(&self, type_id: &str) -> bool {
        self.handlers.contains_key(type_id)
    }

    /// Await the next queued request (async presentation loops).
    pub async fn next_request(&mut self) -> Option<InputRequest> {
        self.requests.recv().await
    }

    /// Block for the next queued request (dedicated presentation threads).
    pub fn blocking_next_request(&mut self) -> Option<InputRequest> {
        self.requests.blocking_recv()
    }

    /// Route one request to its handler, on the presentation loop.
    ///
    /// A request whose type has no registered handler resolves immediately as
    /// cancelled; a routing gap never leaves a worker blocked.
    pub fn dispatch(&mut self, request: InputRequest) {
        let responder = self.responder();
        match self.handlers.get_mut(&request.type_id) {
            Some(handler) => handler.handle(request, &responder),
            None => {
                tracing::warn!(
                    type_id = %request.type_id,
                    request_id = %request.request_id,
                    "no handler registered; cancelling request"
                );
                responder.send(&request.request_id, None, true);
            }
        }
    }

    /// Pump requests until the delivery channel closes.
    ///
    /// Convenience loop for embedders that dedicate a thread to presentation.
    pub fn run_blocking(&mut self) {
        while let Some(request) = self.blocking_next_request() {
            self.dispatch(request);
        }
    }
}
