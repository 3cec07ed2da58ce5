//! The streaming bridge between a background agent run and an SSE response.
//!
//! A run is spawned onto the runtime and reports through its own unbounded
//! queue. A supervising task waits for the run, turns any failure (error or
//! panic) into a `meta {"error": ...}` event, then pushes the sentinel. The
//! response side relays queue items as SSE frames in FIFO order and closes
//! after one terminal `meta` frame.

use std::convert::Infallible;
use std::sync::Arc;

use abacus_agent::{AgentLoop, EventEmitter, StreamEvent, StreamItem};
use axum::response::sse::Event as SseEvent;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, warn};

/// Start `message` on a background task and return the run's queue.
///
/// The run is not tied to the receiver: if the client disconnects, the run
/// finishes anyway and its events are dropped.
pub fn spawn_run(agent: Arc<AgentLoop>, message: String) -> mpsc::UnboundedReceiver<StreamItem> {
    let (emitter, rx) = EventEmitter::channel();

    let run_emitter = emitter.clone();
    let run = tokio::spawn(async move { agent.run(&message, &run_emitter).await });

    tokio::spawn(async move {
        match run.await {
            Ok(Ok(outcome)) => {
                debug!(
                    iterations = outcome.iterations,
                    tool_calls = outcome.tool_calls_made,
                    "Streamed run finished"
                );
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Streamed run failed");
                emitter.emit(StreamEvent::error(e.to_string()));
            }
            Err(join_error) => {
                error!(error = %join_error, "Streamed run task aborted");
                emitter.emit(StreamEvent::error(format!("Agent task failed: {join_error}")));
            }
        }
        emitter.finish();
    });

    rx
}

/// Render one event as an SSE frame.
///
/// If the payload cannot be serialized, that single frame carries an
/// error-describing payload instead.
pub fn to_frame(event: &StreamEvent) -> SseEvent {
    let kind = event.kind.as_str();
    SseEvent::default()
        .event(kind)
        .json_data(&event.payload)
        .unwrap_or_else(|e| {
            warn!(kind, error = %e, "Failed to serialize stream event");
            let fallback = serde_json::json!({ "error": format!("Failed to serialize event: {e}") });
            SseEvent::default().event(kind).data(fallback.to_string())
        })
}

/// Relay queue items as SSE frames until the sentinel, then emit the
/// terminal `meta` frame and end.
pub fn event_stream(
    rx: mpsc::UnboundedReceiver<StreamItem>,
) -> impl Stream<Item = Result<SseEvent, Infallible>> + Send + 'static {
    // A queue with every sender gone ends the same way as one with a sentinel.
    let events = UnboundedReceiverStream::new(rx).map_while(|item| match item {
        StreamItem::Event(event) => Some(event),
        StreamItem::Finished => None,
    });

    events
        .chain(tokio_stream::once(StreamEvent::stream_complete()))
        .map(|event| Ok::<_, Infallible>(to_frame(&event)))
}
