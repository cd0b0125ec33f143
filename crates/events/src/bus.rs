//! In-process event bus for export job lifecycle events.
//!
//! [`ExportEventBus`] is the hub between the worker (publisher) and the
//! reconciler (subscriber). It is shared via `Arc<ExportEventBus>`.

use actionledger_core::export::ExportEvent;
use actionledger_core::types::Timestamp;
use chrono::Utc;
use tokio::sync::broadcast;

/// A lifecycle event addressed to one export job.
#[derive(Debug, Clone)]
pub struct ExportJobEvent {
    /// Queue-assigned job id.
    pub job_id: String,
    pub event: ExportEvent,
    pub timestamp: Timestamp,
}

impl ExportJobEvent {
    pub fn new(job_id: impl Into<String>, event: ExportEvent) -> Self {
        Self {
            job_id: job_id.into(),
            event,
            timestamp: Utc::now(),
        }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`ExportJobEvent`]s.
pub struct ExportEventBus {
    sender: broadcast::Sender<ExportJobEvent>,
}

impl ExportEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are
    /// dropped and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped; the
    /// reconciler (when subscribed) ensures durable capture.
    pub fn publish(&self, event: ExportJobEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ExportJobEvent> {
        self.sender.subscribe()
    }
}

impl Default for ExportEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use actionledger_core::export::ExportEvent;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = ExportEventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(ExportJobEvent::new("42", ExportEvent::Progress { percent: 12 }));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.job_id, "42");
        assert_eq!(received.event, ExportEvent::Progress { percent: 12 });
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = ExportEventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(ExportJobEvent::new("7", ExportEvent::Active));

        assert_eq!(rx1.recv().await.unwrap().job_id, "7");
        assert_eq!(rx2.recv().await.unwrap().job_id, "7");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = ExportEventBus::default();
        bus.publish(ExportJobEvent::new("orphan", ExportEvent::Cancelled));
    }
}
