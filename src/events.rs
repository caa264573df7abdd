//! Event sinks for run progress
//!
//! `emit` is synchronous and never blocks the pipeline. A sink that cannot
//! keep up drops events rather than applying backpressure to the run.

use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::types::{EventKind, ProgressEvent};

/// Destination for progress events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Forwards events into a bounded channel, typically drained by the
/// WebSocket writer.
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving half of a channel of `capacity` events.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(kind = %event.kind, "Event queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Event receiver gone");
            }
        }
    }
}

/// Mirrors events into the log. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ProgressEvent) {
        let stage = event.stage().unwrap_or("-");
        match event.kind {
            EventKind::Warning => tracing::warn!(stage, "{}", event.message),
            EventKind::Error => tracing::error!(stage, "{}", event.message),
            EventKind::Heartbeat => tracing::trace!("heartbeat"),
            kind => tracing::info!(%kind, stage, "{}", event.message),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in emission order.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::bounded(2);
        for i in 0..5 {
            sink.emit(ProgressEvent::info(format!("event {i}")));
        }

        assert_eq!(rx.try_recv().map(|e| e.message).ok(), Some("event 0".into()));
        assert_eq!(rx.try_recv().map(|e| e.message).ok(), Some("event 1".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_survives_closed_receiver() {
        let (sink, rx) = ChannelSink::bounded(1);
        drop(rx);
        sink.emit(ProgressEvent::info("nobody listening"));
    }

    #[test]
    fn memory_sink_preserves_order() {
        let sink = MemorySink::new();
        sink.emit(ProgressEvent::stage_start("plan"));
        sink.emit(ProgressEvent::warning("w"));
        sink.emit(ProgressEvent::stage_complete("plan", 3));
        assert_eq!(
            sink.kinds(),
            vec![EventKind::StageStart, EventKind::Warning, EventKind::StageComplete]
        );
    }
}
