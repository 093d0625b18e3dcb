//! Handoff: blocking human-input coordination for background agents.
//!
//! A worker thread mid-task calls a blocking `ask` and resumes with the
//! operator's structured answer; a single presentation loop is the only
//! place that talks to the human. This crate provides the coordinator that
//! arbitrates the blocking handoff, the bridge that marshals requests onto
//! the presentation loop, the pluggable provider contracts for each exchange
//! kind, and console handlers for terminal frontends.
//!
//! # Quick start
//!
//! ```no_run
//! use handoff::bridge::Bridge;
//! use handoff::console::ConsolePermissionHandler;
//! use handoff::coordinator::Coordinator;
//! use handoff::provider::PermissionProvider;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let coordinator = Arc::new(Coordinator::new());
//! let mut bridge = Bridge::new(Arc::clone(&coordinator));
//! bridge
//!     .register_input_type(
//!         Arc::new(PermissionProvider),
//!         Box::new(ConsolePermissionHandler::stdio(true)),
//!     )
//!     .unwrap();
//!
//! // Worker side: blocks until the operator answers.
//! let worker = std::thread::spawn(move || {
//!     coordinator.ask(
//!         "permission",
//!         json!({"resource": "/tmp/report.txt", "operation": "write"}),
//!     )
//! });
//!
//! // Presentation side: pump one request through its handler.
//! if let Some(request) = bridge.blocking_next_request() {
//!     bridge.dispatch(request);
//! }
//! let response = worker.join().unwrap().unwrap();
//! println!("cancelled: {}", response.cancelled);
//! ```

pub mod bridge;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod error;
pub mod permission;
pub mod provider;
pub mod queue;
pub mod types;
