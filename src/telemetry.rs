//! Session lifecycle telemetry.
//!
//! Diagnostics only: lifecycle transitions are broadcast to any number of
//! observers. Progress values themselves never travel this way.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_stream::wrappers::BroadcastStream;

const LIFECYCLE_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle event emitted by the progress emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub session: u64,
    pub elapsed_ms: u64,
    pub kind: LifecycleEventKind,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventKind {
    SessionStarted,
    SessionSuperseded,
    SessionCancelled,
    SessionCompleted,
    SinkClosed,
    HostShutdown,
}

/// Broadcast publisher stamping events with time since creation.
#[derive(Clone)]
pub struct LifecycleBus {
    tx: broadcast::Sender<LifecycleEvent>,
    start_instant: Instant,
}

impl LifecycleBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(LIFECYCLE_CHANNEL_CAPACITY);
        Self {
            tx,
            start_instant: Instant::now(),
        }
    }

    pub fn publish(&self, session: u64, kind: LifecycleEventKind, detail: Option<String>) {
        let elapsed_ms = Instant::now()
            .saturating_duration_since(self.start_instant)
            .as_millis() as u64;
        // No subscribers is the common case.
        let _ = self.tx.send(LifecycleEvent {
            session,
            elapsed_ms,
            kind,
            detail,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Stream adapter that skips over lag notifications.
    pub fn stream(&self) -> impl Stream<Item = LifecycleEvent> + Send + Unpin {
        BroadcastStream::new(self.tx.subscribe())
            .filter_map(|result| futures::future::ready(result.ok()))
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = LifecycleBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(1, LifecycleEventKind::SessionStarted, None);

        assert_eq!(rx1.try_recv().unwrap().kind, LifecycleEventKind::SessionStarted);
        assert_eq!(rx2.try_recv().unwrap().session, 1);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = LifecycleBus::default();
        bus.publish(7, LifecycleEventKind::HostShutdown, Some("teardown".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn stream_stamps_elapsed_time() {
        let bus = LifecycleBus::new();
        let mut stream = bus.stream();

        tokio::time::advance(std::time::Duration::from_millis(400)).await;
        bus.publish(2, LifecycleEventKind::SessionCompleted, None);

        let event = stream.next().await.unwrap();
        assert_eq!(event.kind, LifecycleEventKind::SessionCompleted);
        assert_eq!(event.elapsed_ms, 400);
    }
}
