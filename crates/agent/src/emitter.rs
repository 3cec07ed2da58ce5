//! The optional side-channel a run reports progress to.

use tokio::sync::mpsc;
use tracing::trace;

use crate::stream_event::{StreamEvent, StreamItem};

/// Sends [`StreamEvent`]s to whoever holds the receiving end.
///
/// Emission is best-effort and never blocks: the queue is unbounded, and a
/// closed receiver (the client went away) just drops the event. A disabled
/// emitter drops everything.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    tx: Option<mpsc::UnboundedSender<StreamItem>>,
}

impl EventEmitter {
    /// An emitter that discards all events.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A fresh per-run queue: the emitter plus its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StreamItem>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn emit(&self, event: StreamEvent) {
        self.send(StreamItem::Event(event));
    }

    /// Push the end-of-run sentinel.
    pub fn finish(&self) {
        self.send(StreamItem::Finished);
    }

    fn send(&self, item: StreamItem) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(item).is_err() {
            trace!("Event receiver closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order_then_sentinel() {
        let (emitter, mut rx) = EventEmitter::channel();
        emitter.emit(StreamEvent::thinking("one"));
        emitter.emit(StreamEvent::thinking("two"));
        emitter.finish();

        let mut seen = vec![];
        while let Some(item) = rx.recv().await {
            match item {
                StreamItem::Event(e) => seen.push(e.payload["content"].as_str().unwrap().to_string()),
                StreamItem::Finished => break,
            }
        }
        assert_eq!(seen, ["one", "two"]);
    }

    #[test]
    fn disabled_emitter_is_silent() {
        let emitter = EventEmitter::disabled();
        assert!(!emitter.is_enabled());
        emitter.emit(StreamEvent::thinking("ignored"));
        emitter.finish();
    }

    #[test]
    fn closed_receiver_does_not_panic() {
        let (emitter, rx) = EventEmitter::channel();
        drop(rx);
        emitter.emit(StreamEvent::thinking("nobody listening"));
        emitter.finish();
    }
}
