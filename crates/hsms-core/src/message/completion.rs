//! Completion callbacks attached to primary messages.
//!
//! A primary message may carry a [`Completion`].  The connection layer
//! invokes it once the reply that correlates with the primary arrives.
//! This crate only stores the callback and hands it back out. Timeouts and
//! at-most-once delivery are up to the connection.

use std::fmt;
use std::sync::Arc;

use super::data::DataMessage;

/// Receives the reply to a primary message.
///
/// Any `Fn(&DataMessage) + Send + Sync` closure is a handler.
#[cfg_attr(test, mockall::automock)]
pub trait ReplyHandler: Send + Sync {
    fn on_reply(&self, reply: &DataMessage);
}

impl<F> ReplyHandler for F
where
    F: Fn(&DataMessage) + Send + Sync,
{
    fn on_reply(&self, reply: &DataMessage) {
        self(reply)
    }
}

/// Shared handle to a [`ReplyHandler`].
///
/// Cloning is cheap; clones invoke the same handler.
#[derive(Clone)]
pub struct Completion {
    handler: Arc<dyn ReplyHandler>,
}

impl Completion {
    pub fn new(handler: impl ReplyHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Wraps a handler that is already shared elsewhere.
    pub fn from_shared(handler: Arc<dyn ReplyHandler>) -> Self {
        Self { handler }
    }

    /// Passes `reply` to the handler.
    pub fn invoke(&self, reply: &DataMessage) {
        self.handler.on_reply(reply);
    }

    /// Returns `true` if both handles point at the same handler.
    pub fn same_handler(&self, other: &Completion) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Completion(..)")
    }
}
