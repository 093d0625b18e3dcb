//! Follow-up message queue for a running task.
//!
//! Holds the operator message that started a task plus any messages typed
//! while the worker is busy. The worker drains pending messages between
//! iterations; the presentation side pushes from its own thread.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe queue of operator messages for one task.
pub struct MessageQueue {
    initial_message: String,
    pending: Mutex<VecDeque<String>>,
}

impl MessageQueue {
    /// Create a queue seeded with the message that started the task.
    pub fn new(initial_message: impl Into<String>) -> Self {
        Self {
            initial_message: initial_message.into(),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// The message that started this task.
    pub fn initial_message(&self) -> &str {
        &self.initial_message
    }

    /// Queue a follow-up message. Empty messages are ignored.
    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }
        self.lock().push_back(message);
    }

    /// Take the oldest pending message, if any.
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    /// True when follow-up messages are waiting.
    pub fn has_pending(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Drop all pending messages.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
