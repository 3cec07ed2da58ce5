//! Message and Transcript domain types.
//!
//! These are the value objects that flow through one agent run:
//! the user message opens the transcript, the model appends assistant
//! messages, and the dispatcher appends one tool result per requested call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for one agent run (one request).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model
    Assistant,
    /// System instruction (never stored in a transcript)
    System,
    /// Tool execution result
    Tool,
}

/// A single message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create an assistant message that requests tool calls.
    pub fn assistant_with_calls(
        content: impl Into<String>,
        tool_calls: Vec<MessageToolCall>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content.into());
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Whether this is an assistant message that ends the run.
    pub fn is_final_answer(&self) -> bool {
        self.role == Role::Assistant && self.tool_calls.is_empty()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call within its assistant turn
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON string, exactly as the model produced them
    pub arguments: String,
}

/// The ordered message history of one run.
///
/// Append-only. The first entry is the user message; every tool result must
/// answer a call from the assistant message that precedes its batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// The run this transcript belongs to
    pub id: RunId,

    messages: Vec<Message>,

    /// When the run started
    pub created_at: DateTime<Utc>,
}

impl Transcript {
    /// Start a transcript from the user's request.
    pub fn start(user_message: impl Into<String>) -> Self {
        Self {
            id: RunId::new(),
            messages: vec![Message::user(user_message)],
            created_at: Utc::now(),
        }
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append an assistant message produced by the decision step.
    pub fn push_assistant(&mut self, message: Message) -> Result<(), Error> {
        if message.role != Role::Assistant {
            return Err(Error::Transcript(format!(
                "expected an assistant message, got {:?}",
                message.role
            )));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Append a batch of tool results.
    ///
    /// Each result's call-id must name a call in the most recent assistant
    /// message; anything else would corrupt the replay sent to the model.
    pub fn push_tool_results(&mut self, results: Vec<Message>) -> Result<(), Error> {
        let Some(assistant) = self
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
        else {
            return Err(Error::Transcript(
                "tool results without a preceding assistant message".into(),
            ));
        };

        for result in &results {
            let Some(call_id) = result.tool_call_id.as_deref() else {
                return Err(Error::Transcript("tool result without a call id".into()));
            };
            if !assistant.tool_calls.iter().any(|tc| tc.id == call_id) {
                return Err(Error::Transcript(format!(
                    "tool result for unknown call id '{call_id}'"
                )));
            }
        }

        self.messages.extend(results);
        Ok(())
    }

    /// The terminal assistant message, if the run has reached one.
    ///
    /// This is always the last message, regardless of how many tool rounds
    /// preceded it.
    pub fn final_answer(&self) -> Option<&Message> {
        self.messages.last().filter(|m| m.is_final_answer())
    }
}
