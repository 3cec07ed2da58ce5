//! # Abacus Core
//!
//! Domain types, traits, and error definitions for the Abacus agent.
//! This crate has **no framework dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two seams of the system are traits here:
//! - [`Provider`]: the language-model boundary
//! - [`Tool`]: an executable capability held by the [`ToolRegistry`]
//!
//! Implementations live in their respective crates, so the agent loop can be
//! exercised end to end against scripted providers and fake registries.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Message, MessageToolCall, Role, RunId, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolRegistry, ToolResult};
