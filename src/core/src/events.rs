//! Notification sinks for ledger events.
//!
//! Delivery is best-effort: a sink never fails or blocks the operation that
//! produced the event.

use crate::types::LedgerEvent;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::info;

/// Receives [`LedgerEvent`]s after successful mutations.
pub trait EventSink: Send + Sync {
    /// Publishes an event.
    fn publish(&self, event: &LedgerEvent);
}

/// Writes every event as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &LedgerEvent) {
        let action = match event {
            LedgerEvent::Deposited { .. } => "Deposited",
            LedgerEvent::Withdrawn { .. } => "Withdrawn",
        };
        info!(account = %event.account(), amount = %event.amount(), "{}", action);
    }
}

/// Discards every event.
impl EventSink for () {
    fn publish(&self, _event: &LedgerEvent) {}
}

/// Forwards events to a channel; a hung-up receiver is ignored.
impl EventSink for Sender<LedgerEvent> {
    fn publish(&self, event: &LedgerEvent) {
        let _ = self.send(event.clone());
    }
}

/// Fans every event out to both sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn publish(&self, event: &LedgerEvent) {
        self.0.publish(event);
        self.1.publish(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn publish(&self, event: &LedgerEvent) {
        (**self).publish(event)
    }
}
