//! Blocking ask coordination between worker threads and the presentation loop.
//!
//! The coordinator owns the provider registry, the correlation-id counter,
//! and one pending-response slot. A worker thread calls [`Coordinator::ask`]
//! and parks on the slot's condvar; the presentation side eventually calls
//! [`Coordinator::set_response`], which validates, stores, and wakes exactly
//! the blocked caller.
//!
//! One ask is in flight at a time per coordinator instance; concurrent
//! callers queue on an internal gate and run in turn. The slot is fully
//! reset at the start of every ask, before the delivery callback runs, so a
//! stale response from a prior call can never satisfy a new one.

use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::InputError;
use crate::provider::InputProvider;
use crate::types::{InputRequest, InputResponse};

/// Delivery callback installed by the bridge.
///
/// Invoked on whatever thread called `ask`; its only job is to enqueue the
/// request for the presentation loop. It must return quickly and must never
/// itself wait for the operator.
pub type DeliverFn = dyn Fn(InputRequest) + Send + Sync;

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Identity of the one in-flight ask.
struct PendingAsk {
    request_id: String,
    type_id: String,
}

/// Mutable slot contents, guarded by the slot mutex.
#[derive(Default)]
struct SlotState {
    pending: Option<PendingAsk>,
    response: Option<InputResponse>,
}

/// The single pending-response cell plus its wakeup primitive.
struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Thread-safe arbiter for blocking human-input requests.
pub struct Coordinator {
    providers: Mutex<BTreeMap<String, Arc<dyn InputProvider>>>,
    deliver: Mutex<Option<Arc<DeliverFn>>>,
    counter: Mutex<u64>,
    // Serializes asks; held for the whole arm/deliver/wait span so a second
    // caller queues here instead of clobbering the slot.
    ask_gate: Mutex<()>,
    slot: Slot,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            providers: Mutex::new(BTreeMap::new()),
            deliver: Mutex::new(None),
            counter: Mutex::new(0),
            ask_gate: Mutex::new(()),
            slot: Slot {
                state: Mutex::new(SlotState::default()),
                ready: Condvar::new(),
            },
        }
    }

    /// Register an input provider under its type id.
    pub fn register_provider(
        &self,
        provider: Arc<dyn InputProvider>,
    ) -> Result<(), InputError> {
        let type_id = provider.type_id().to_string();
        let mut providers = lock(&self.providers);
        if providers.contains_key(&type_id) {
            return Err(InputError::DuplicateType(type_id));
        }
        providers.insert(type_id, provider);
        Ok(())
    }

    /// Look up a registered provider by type id.
    pub fn provider(&self, type_id: &str) -> Option<Arc<dyn InputProvider>> {
        lock(&self.providers).get(type_id).cloned()
    }

    /// Type ids registered so far, in sorted order.
    pub fn registered_type_ids(&self) -> Vec<String> {
        lock(&self.providers).keys().cloned().collect()
    }

    /// Install the delivery callback that marshals requests toward the
    /// presentation loop. Normally called once by the bridge at setup.
    pub fn set_deliver(&self, deliver: impl Fn(InputRequest) + Send + Sync + 'static) {
        *lock(&self.deliver) = Some(Arc::new(deliver));
    }

    /// Remove the delivery callback, closing the bridge's request channel so
    /// a dedicated presentation loop can wind down.
    ///
    /// Subsequent asks fail with `NotReady`. An in-flight ask is unaffected;
    /// the presentation side can still resolve it through `set_response`.
    pub fn close(&self) {
        *lock(&self.deliver) = None;
    }

    /// Request human input and block the calling thread until a response
    /// arrives.
    ///
    /// Registration and payload problems are reported synchronously before
    /// anything reaches the presentation loop. Past that point the call
    /// always resolves with a response, possibly a cancelled one, and
    /// never with an error.
    pub fn ask(&self, type_id: &str, data: Value) -> Result<InputResponse, InputError> {
        let Some(deliver) = lock(&self.deliver).clone() else {
            return Err(InputError::NotReady);
        };
        let Some(provider) = self.provider(type_id) else {
            return Err(InputError::UnknownType(type_id.to_string()));
        };
        provider
            .validate_request(&data)
            .map_err(|message| InputError::InvalidRequest {
                type_id: type_id.to_string(),
                message,
            })?;

        let _in_flight = lock(&self.ask_gate);

        let request_id = {
            let mut counter = lock(&self.counter);
            *counter += 1;
            format!("req_{}", *counter)
        };

        // Arm the slot before delivery so the response cannot race the reset,
        // and clear any leftovers from a previous call.
        {
            let mut state = lock(&self.slot.state);
            state.response = None;
            state.pending = Some(PendingAsk {
                request_id: request_id.clone(),
                type_id: type_id.to_string(),
            });
        }

        deliver(provider.build_request(data, &request_id));

        let mut state = lock(&self.slot.state);
        while state.response.is_none() {
            state = self
                .slot
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        // The wait loop only exits once set_response stored a value.
        Ok(state.response.take().unwrap_or_else(|| {
            InputResponse::cancelled(request_id)
        }))
    }

    /// Deliver the operator's response and wake the blocked caller.
    ///
    /// Called from the presentation side. Responses that do not match the
    /// in-flight correlation id are dropped; an invalid payload is converted
    /// into a cancelled response so the worker always unblocks.
    pub fn set_response(&self, response: InputResponse) {
        let mut state = lock(&self.slot.state);
        let Some(pending) = state.pending.as_ref() else {
            tracing::warn!(
                request_id = %response.request_id,
                "dropping response with no ask in flight"
            );
            return;
        };
        if pending.request_id != response.request_id {
            tracing::warn!(
                expected = %pending.request_id,
                got = %response.request_id,
                "dropping response for a different request"
            );
            return;
        }

        let resolved = if response.cancelled {
            response
        } else {
            self.checked_response(&pending.type_id, response)
        };

        state.pending = None;
        state.response = Some(resolved);
        self.slot.ready.notify_one();
    }

    /// Run the provider's response shape check, downgrading failures to a
    /// cancelled response instead of surfacing them to the worker.
    fn checked_response(&self, type_id: &str, response: InputResponse) -> InputResponse {
        let verdict = match self.provider(type_id) {
            Some(provider) => {
                let data = response.data.clone().unwrap_or(Value::Null);
                provider.validate_response(&data)
            }
            // Provider vanished mid-flight; nothing left to check against.
            None => Ok(()),
        };
        match verdict {
            Ok(()) => response,
            Err(message) => {
                tracing::error!(
                    type_id,
                    request_id = %response.request_id,
                    message,
                    "invalid response payload; resolving ask as cancelled"
                );
                InputResponse::cancelled(response.request_id)
            }
        }
    }
}

/// Lock a mutex, ignoring poisoning from a panicked peer.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ClarificationProvider, PermissionDecision, PermissionProvider};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use tokio::sync::mpsc;

    fn coordinator_with_providers() -> Coordinator {
        let coordinator = Coordinator::new();
        coordinator
            .register_provider(Arc::new(ClarificationProvider))
            .expect("register clarification");
        coordinator
            .register_provider(Arc::new(PermissionProvider))
            .expect("register permission");
        coordinator
    }

    /// Install a delivery callback that answers every request inline with the
    /// supplied function, on the asking thread itself.
    fn install_echo(coordinator: &Arc<Coordinator>, respond: impl Fn(&InputRequest) -> InputResponse + Send + Sync + 'static) {
        let inner = Arc::clone(coordinator);
        coordinator.set_deliver(move |request| {
            let response = respond(&request);
            inner.set_response(response);
        });
    }

    #[test]
    fn ask_fails_not_ready_without_delivery_callback() {
        let coordinator = coordinator_with_providers();
        let err = coordinator
            .ask("permission", json!({"resource": "/tmp/x", "operation": "read"}))
            .unwrap_err();
        assert!(matches!(err, InputError::NotReady));
    }

    #[test]
    fn ask_fails_for_unknown_type_without_touching_slot() {
        let coordinator = Arc::new(coordinator_with_providers());
        install_echo(&coordinator, |request| {
            InputResponse::answered(request.request_id.clone(), json!({}))
        });
        let err = coordinator.ask("confirmation", json!({})).unwrap_err();
        assert!(matches!(err, InputError::UnknownType(id) if id == "confirmation"));
        assert!(lock(&coordinator.slot.state).pending.is_none());
    }

    #[test]
    fn ask_rejects_invalid_payload_before_dispatch() {
        let coordinator = Arc::new(coordinator_with_providers());
        let dispatched = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&dispatched);
        coordinator.set_deliver(move |_request| {
            seen.store(true, Ordering::SeqCst);
        });

        let err = coordinator
            .ask("clarification", json!({"questions": []}))
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidRequest { .. }));
        assert!(!dispatched.load(Ordering::SeqCst), "request was dispatched");
    }

    #[test]
    fn duplicate_provider_registration_fails() {
        let coordinator = coordinator_with_providers();
        let err = coordinator
            .register_provider(Arc::new(PermissionProvider))
            .unwrap_err();
        assert!(matches!(err, InputError::DuplicateType(id) if id == "permission"));
        assert_eq!(
            coordinator.registered_type_ids(),
            vec!["clarification".to_string(), "permission".to_string()]
        );
    }

    #[test]
    fn sequential_asks_get_strictly_increasing_ids() {
        let coordinator = Arc::new(coordinator_with_providers());
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let log = Arc::clone(&seen);
        install_echo(&coordinator, move |request| {
            lock(&log).push(request.request_id.clone());
            InputResponse::answered(
                request.request_id.clone(),
                PermissionDecision::Deny.into_payload(),
            )
        });

        for _ in 0..3 {
            coordinator
                .ask("permission", json!({"resource": "/tmp/x", "operation": "read"}))
                .expect("ask");
        }
        assert_eq!(
            *lock(&seen),
            vec!["req_1".to_string(), "req_2".to_string(), "req_3".to_string()]
        );
    }

    #[test]
    fn set_response_unblocks_worker_thread_with_payload() {
        let coordinator = Arc::new(coordinator_with_providers());
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<InputRequest>();
        coordinator.set_deliver(move |request| {
            let _ = request_tx.send(request);
        });

        let asker = Arc::clone(&coordinator);
        let worker = thread::spawn(move || {
            asker.ask(
                "permission",
                json!({"resource": "/tmp/x", "operation": "delete_object"}),
            )
        });

        let request = request_rx.blocking_recv().expect("request delivered");
        assert_eq!(request.type_id, "permission");
        coordinator.set_response(InputResponse::answered(
            request.request_id,
            PermissionDecision::AllowOnce.into_payload(),
        ));

        let response = worker.join().expect("worker join").expect("ask");
        assert!(!response.cancelled);
        assert_eq!(
            PermissionDecision::from_payload(&response.data.expect("payload")),
            Some(PermissionDecision::AllowOnce)
        );
    }

    #[test]
    fn response_with_stale_id_is_dropped() {
        let coordinator = Arc::new(coordinator_with_providers());
        let inner = Arc::clone(&coordinator);
        coordinator.set_deliver(move |request| {
            // A leftover id from an earlier exchange must not satisfy this ask.
            inner.set_response(InputResponse::answered(
                "req_999",
                PermissionDecision::Deny.into_payload(),
            ));
            inner.set_response(InputResponse::answered(
                request.request_id.clone(),
                PermissionDecision::AllowSession.into_payload(),
            ));
        });

        let response = coordinator
            .ask("permission", json!({"resource": "/tmp/x", "operation": "write"}))
            .expect("ask");
        assert_eq!(
            PermissionDecision::from_payload(&response.data.expect("payload")),
            Some(PermissionDecision::AllowSession)
        );
    }

    #[test]
    fn invalid_response_payload_resolves_as_cancelled() {
        let coordinator = Arc::new(coordinator_with_providers());
        install_echo(&coordinator, |request| {
            InputResponse::answered(request.request_id.clone(), json!({"decision": "maybe"}))
        });

        let response = coordinator
            .ask("permission", json!({"resource": "/tmp/x", "operation": "read"}))
            .expect("ask");
        assert!(response.cancelled);
        assert!(response.data.is_none());
    }

    #[test]
    fn cancelled_response_skips_payload_validation() {
        let coordinator = Arc::new(coordinator_with_providers());
        install_echo(&coordinator, |request| {
            InputResponse::cancelled(request.request_id.clone())
        });

        let response = coordinator
            .ask("clarification", json!({"questions": ["Q1"]}))
            .expect("ask");
        assert!(response.cancelled);
    }

    #[test]
    fn late_response_after_resolution_is_ignored() {
        let coordinator = Arc::new(coordinator_with_providers());
        install_echo(&coordinator, |request| {
            InputResponse::answered(
                request.request_id.clone(),
                PermissionDecision::Deny.into_payload(),
            )
        });

        let response = coordinator
            .ask("permission", json!({"resource": "/tmp/x", "operation": "read"}))
            .expect("ask");
        assert!(!response.cancelled);

        // The id was consumed; a duplicate must not re-arm the slot.
        coordinator.set_response(InputResponse::answered(
            "req_1",
            PermissionDecision::AllowOnce.into_payload(),
        ));
        assert!(lock(&coordinator.slot.state).response.is_none());
    }
}
