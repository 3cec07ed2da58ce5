//! Agent-level streaming events.
//!
//! A `StreamEvent` is what the loop reports while it runs. The gateway
//! forwards each one to the client as a single SSE frame named after its
//! [`EventKind`].

use abacus_core::message::Message;
use serde::{Deserialize, Serialize};

/// Event names on the wire:
/// - `thinking`: a progress note (`{"content": ...}`)
/// - `tool_event`: the raw result of one loop step
/// - `meta`: errors and stream bookkeeping
/// - `done`: the final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Thinking,
    ToolEvent,
    Meta,
    Done,
}

impl EventKind {
    /// SSE event name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thinking => "thinking",
            Self::ToolEvent => "tool_event",
            Self::Meta => "meta",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event: a kind plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl StreamEvent {
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        Self::new(
            EventKind::Thinking,
            serde_json::json!({ "content": content.into() }),
        )
    }

    /// The messages one loop step produced, keyed by step name
    /// (`llm_call` or `tool_node`).
    pub fn step(step: &str, messages: &[Message]) -> Self {
        let messages = serde_json::to_value(messages)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));
        let mut payload = serde_json::Map::new();
        payload.insert(step.to_string(), serde_json::json!({ "messages": messages }));
        Self::new(EventKind::ToolEvent, serde_json::Value::Object(payload))
    }

    pub fn done(answer: impl Into<String>) -> Self {
        Self::new(
            EventKind::Done,
            serde_json::json!({ "response": answer.into() }),
        )
    }

    /// A run failure, surfaced as `meta {"error": ...}`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Meta, serde_json::json!({ "error": message.into() }))
    }

    /// The terminal frame of every stream.
    pub fn stream_complete() -> Self {
        Self::new(
            EventKind::Meta,
            serde_json::json!({ "usage": {}, "info": "stream_complete" }),
        )
    }
}

/// What travels through a run's queue: an event, or the end-of-run sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(StreamEvent),
    Finished,
}
