//! The agent reasoning loop implementation.

use std::sync::Arc;

use abacus_config::AppConfig;
use abacus_core::error::Error;
use abacus_core::message::{MessageToolCall, Transcript};
use abacus_core::provider::Provider;
use abacus_core::tool::ToolRegistry;
use tracing::{debug, info, warn};

use crate::decision::{Decision, DecisionStep};
use crate::dispatcher::ToolDispatcher;
use crate::emitter::EventEmitter;
use crate::stream_event::StreamEvent;

/// Default bound on decision steps per run.
pub const DEFAULT_MAX_ITERATIONS: u32 = 25;

/// Where a run currently is.
enum RunState {
    Deciding,
    Dispatching(Vec<MessageToolCall>),
    Done(String),
}

/// The result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Text of the terminal assistant message
    pub answer: String,

    /// Full transcript, ending with the terminal assistant message
    pub transcript: Transcript,

    /// Decision steps taken
    pub iterations: u32,

    /// Tool calls dispatched across all rounds
    pub tool_calls_made: usize,
}

/// The loop controller: alternates decision and dispatch until a final answer.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct AgentLoop {
    decision: DecisionStep,
    dispatcher: ToolDispatcher,
    max_iterations: u32,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            decision: DecisionStep::new(provider, model, Arc::clone(&tools)),
            dispatcher: ToolDispatcher::new(tools),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Create a loop configured from the `[provider]` and `[agent]` sections.
    pub fn from_config(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: &AppConfig) -> Self {
        let model = config.provider.deployment.clone().unwrap_or_default();
        let mut agent = Self::new(provider, model, tools).with_max_iterations(config.agent.max_iterations);
        agent.decision = agent
            .decision
            .with_temperature(config.provider.temperature)
            .with_max_tokens(config.provider.max_tokens)
            .with_system_prompt(config.agent.system_prompt.clone());
        agent
    }

    /// Set the maximum number of decision steps.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.decision = self.decision.with_temperature(temperature);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.decision = self.decision.with_system_prompt(prompt);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        self.decision.tools()
    }

    /// Run the loop for one user message.
    ///
    /// Emits `thinking` before the first decision, one `tool_event` per step,
    /// then a closing `thinking` and the `done` answer. On failure nothing
    /// further is emitted; the caller reports the error.
    pub async fn run(&self, user_message: &str, emitter: &EventEmitter) -> Result<RunOutcome, Error> {
        let mut transcript = Transcript::start(user_message);
        let mut iterations = 0u32;
        let mut tool_calls_made = 0usize;

        info!(run_id = %transcript.id, "Starting agent run");
        emitter.emit(StreamEvent::thinking(format!("Processing: {user_message}")));

        let mut state = RunState::Deciding;
        let answer = loop {
            state = match state {
                RunState::Deciding => {
                    if iterations >= self.max_iterations {
                        warn!(
                            run_id = %transcript.id,
                            max_iterations = self.max_iterations,
                            "Loop bound exceeded without a final answer"
                        );
                        return Err(Error::LoopBoundExceeded {
                            max_iterations: self.max_iterations,
                        });
                    }
                    iterations += 1;
                    debug!(run_id = %transcript.id, iteration = iterations, "Deciding");

                    let decision = self.decision.decide(&transcript).await?;
                    emitter.emit(StreamEvent::step("llm_call", std::slice::from_ref(decision.message())));

                    match decision {
                        Decision::Final(message) => {
                            let answer = message.content.clone();
                            transcript.push_assistant(message)?;
                            RunState::Done(answer)
                        }
                        Decision::ToolCalls(message) => {
                            let calls = message.tool_calls.clone();
                            transcript.push_assistant(message)?;
                            RunState::Dispatching(calls)
                        }
                    }
                }
                RunState::Dispatching(calls) => {
                    debug!(run_id = %transcript.id, tool_count = calls.len(), "Dispatching tool calls");

                    let results = self.dispatcher.dispatch(&calls).await;
                    tool_calls_made += calls.len();
                    emitter.emit(StreamEvent::step("tool_node", &results));
                    transcript.push_tool_results(results)?;
                    RunState::Deciding
                }
                RunState::Done(answer) => break answer,
            };
        };

        info!(
            run_id = %transcript.id,
            iterations,
            tool_calls_made,
            "Agent run complete"
        );
        emitter.emit(StreamEvent::thinking("Agent processing complete"));
        emitter.emit(StreamEvent::done(answer.clone()));

        Ok(RunOutcome {
            answer,
            transcript,
            iterations,
            tool_calls_made,
        })
    }
}
