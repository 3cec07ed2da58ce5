//! The tool-calling agent loop, the heart of Abacus.
//!
//! One run follows a **Decide → Dispatch → Decide** cycle:
//!
//! 1. **Start** a transcript from the user's message
//! 2. **Decide**: send system instruction + transcript + tool schemas to the model
//! 3. **If tool calls**: dispatch each against the registry, append the results, go to 2
//! 4. **If text only**: that message is the final answer
//!
//! The loop stops at the first final answer or fails once the decision-step
//! bound is exceeded. Progress is reported to an optional [`EventEmitter`].

pub mod decision;
pub mod dispatcher;
pub mod emitter;
pub mod loop_runner;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use decision::{Decision, DecisionStep};
pub use dispatcher::ToolDispatcher;
pub use emitter::EventEmitter;
pub use loop_runner::{AgentLoop, RunOutcome};
pub use stream_event::{EventKind, StreamEvent, StreamItem};
