//! The transport seam.
//!
//! The directory never talks to sockets. It pushes [`ServerMessage`]s into
//! a [`ConnectionSink`] and the transport layer (out of scope here) does
//! the delivery. `close` asks the transport to drop the connection; the
//! transport is expected to report the drop back via
//! [`SessionDirectory::disconnect`](crate::SessionDirectory::disconnect).

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use clickpot_types::ServerMessage;

/// Outbound side of one live connection.
pub trait ConnectionSink: Send {
    /// Deliver a message to the connected client. Best-effort: a sink for
    /// a dying connection may drop messages on the floor.
    fn send(&self, message: &ServerMessage);

    /// Ask the transport to terminate the connection.
    fn close(&self);
}

/// In-memory sink that records everything — the test double used across
/// the workspace's unit and integration tests.
#[derive(Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<ServerMessage>>>,
    closed: Arc<AtomicBool>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<ServerMessage> {
        self.sent.lock().expect("sink lock poisoned").clone()
    }

    /// The last message sent, if any.
    #[must_use]
    pub fn last(&self) -> Option<ServerMessage> {
        self.sent.lock().expect("sink lock poisoned").last().cloned()
    }

    /// Whether `close` was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Drop all recorded messages.
    pub fn clear(&self) {
        self.sent.lock().expect("sink lock poisoned").clear();
    }
}

impl ConnectionSink for RecordingSink {
    fn send(&self, message: &ServerMessage) {
        self.sent
            .lock()
            .expect("sink lock poisoned")
            .push(message.clone());
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_captures_in_order() {
        let sink = RecordingSink::new();
        sink.send(&ServerMessage::GameTick { time_left_ms: 500 });
        sink.send(&ServerMessage::GameTick { time_left_ms: 400 });

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], ServerMessage::GameTick { time_left_ms: 400 });
        assert_eq!(sink.last(), Some(ServerMessage::GameTick { time_left_ms: 400 }));
    }

    #[test]
    fn close_is_observable() {
        let sink = RecordingSink::new();
        assert!(!sink.is_closed());
        sink.close();
        assert!(sink.is_closed());
    }
}
