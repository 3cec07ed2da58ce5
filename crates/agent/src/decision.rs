//! The decision step: one model call per loop iteration.

use std::sync::Arc;

use abacus_config::DEFAULT_SYSTEM_PROMPT;
use abacus_core::error::Error;
use abacus_core::message::{Message, MessageToolCall, Transcript};
use abacus_core::provider::{Provider, ProviderRequest};
use abacus_core::tool::ToolRegistry;
use tracing::debug;

/// What the model decided.
#[derive(Debug, Clone)]
pub enum Decision {
    /// A terminal assistant message with no tool calls.
    Final(Message),
    /// An assistant message carrying at least one tool call.
    ToolCalls(Message),
}

impl Decision {
    fn from_message(message: Message) -> Self {
        if message.tool_calls.is_empty() {
            Self::Final(message)
        } else {
            Self::ToolCalls(message)
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            Self::Final(m) | Self::ToolCalls(m) => m,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Self::Final(m) | Self::ToolCalls(m) => m,
        }
    }

    pub fn tool_calls(&self) -> &[MessageToolCall] {
        &self.message().tool_calls
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}

/// Asks the model whether to answer or call tools.
///
/// The system instruction is prepended to every request and never stored
/// in the transcript.
pub struct DecisionStep {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
}

impl DecisionStep {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run one decision over the full transcript.
    ///
    /// Any provider failure becomes [`Error::ModelUnavailable`]; there is no retry.
    pub async fn decide(&self, transcript: &Transcript) -> Result<Decision, Error> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(transcript.messages().iter().cloned());

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tools.definitions(),
        };

        let response = self.provider.complete(request).await?;

        debug!(
            provider = self.provider.name(),
            model = %response.model,
            tool_calls = response.message.tool_calls.len(),
            total_tokens = response.usage.as_ref().map(|u| u.total_tokens),
            "Decision received"
        );

        Ok(Decision::from_message(response.message))
    }
}
