use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::event::StepEvent;

/// Concurrency-safe, append-only registry of event observers keyed by topic.
///
/// Publication is fire-and-forget: events are pushed over unbounded channels
/// and delivery failures are ignored, so a slow, dropped, or panicking
/// observer never back-pressures or fails the producing step. Registrations
/// are appended and only released when the owning step is dropped. A
/// registration racing an in-flight publish may or may not observe that
/// event; it observes everything published after it.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    topics: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<StepEvent>>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer on `topic` and return its event receiver.
    pub fn register(&self, topic: impl Into<String>) -> mpsc::UnboundedReceiver<StepEvent> {
        let topic = topic.into();
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics
            .lock()
            .unwrap()
            .entry(topic.clone())
            .or_default()
            .push(tx);
        tracing::trace!(topic = %topic, "observer registered");
        rx
    }

    /// Publish to every observer of `topic`.
    pub fn publish_blind(&self, topic: &str, event: &StepEvent) {
        if let Some(observers) = self.topics.lock().unwrap().get(topic) {
            for observer in observers {
                let _ = observer.send(event.clone());
            }
        }
    }

    /// Publish to every observer on every topic.
    pub fn publish_all_blind(&self, event: &StepEvent) {
        for observers in self.topics.lock().unwrap().values() {
            for observer in observers {
                let _ = observer.send(event.clone());
            }
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap()
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
