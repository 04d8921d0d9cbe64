//! Host notification channel.
//!
//! An embedding host may want to show progress while models load and a run is in
//! flight. The engine never looks for a host: it is handed a [`HostNotifier`]
//! at construction and [`NoopNotifier`] is used when nothing is attached.
//! Delivery is best-effort; a notifier must never fail the run.
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Named events broadcast to the host.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostEvent {
    StartProgress,
    EndProgress,
    FastModelLoad,
    HighModelLoad,
    FastTransformLoad,
    HighTransformLoad,
    SizeError,
}

impl HostEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HostEvent::StartProgress => "startProgress",
            HostEvent::EndProgress => "endProgress",
            HostEvent::FastModelLoad => "fastModelLoad",
            HostEvent::HighModelLoad => "highModelLoad",
            HostEvent::FastTransformLoad => "fastTransformLoad",
            HostEvent::HighTransformLoad => "highTransformLoad",
            HostEvent::SizeError => "sizeError",
        }
    }
}

impl std::fmt::Display for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait HostNotifier: Send + Sync {
    fn broadcast(&self, event: HostEvent);
}

/// Default notifier when no host is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl HostNotifier for NoopNotifier {
    fn broadcast(&self, _event: HostEvent) {}
}

/// Writes every event to the log; used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl HostNotifier for TracingNotifier {
    fn broadcast(&self, event: HostEvent) {
        info!(event = event.as_str(), "host event");
    }
}

/// Fans events out over a tokio broadcast channel to any number of host listeners.
pub struct ChannelNotifier {
    sender: broadcast::Sender<HostEvent>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.sender.subscribe()
    }
}

impl HostNotifier for ChannelNotifier {
    fn broadcast(&self, event: HostEvent) {
        // No subscribers is not an error for a best-effort channel
        if self.sender.send(event).is_err() {
            debug!(event = event.as_str(), "no host listening");
        }
    }
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, event: HostEvent) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }
}

impl HostNotifier for RecordingNotifier {
    fn broadcast(&self, event: HostEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_without_listeners_is_silent() {
        let notifier = ChannelNotifier::new(4);
        notifier.broadcast(HostEvent::StartProgress);
    }

    #[test]
    fn channel_delivers_to_subscribers() {
        let notifier = ChannelNotifier::new(4);
        let mut rx = notifier.subscribe();
        notifier.broadcast(HostEvent::FastModelLoad);
        notifier.broadcast(HostEvent::EndProgress);
        assert_eq!(rx.try_recv().unwrap(), HostEvent::FastModelLoad);
        assert_eq!(rx.try_recv().unwrap(), HostEvent::EndProgress);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn recording_counts_events() {
        let notifier = RecordingNotifier::new();
        notifier.broadcast(HostEvent::StartProgress);
        notifier.broadcast(HostEvent::EndProgress);
        notifier.broadcast(HostEvent::EndProgress);
        assert_eq!(notifier.count(HostEvent::EndProgress), 2);
        assert_eq!(notifier.events()[0], HostEvent::StartProgress);
    }

    #[test]
    fn event_names_match_host_blocks() {
        let json = serde_json::to_string(&HostEvent::HighTransformLoad).unwrap();
        assert_eq!(json, "\"highTransformLoad\"");
        assert_eq!(HostEvent::SizeError.to_string(), "sizeError");
    }
}
