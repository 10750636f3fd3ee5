//! Conversational reservation agent
//!
//! This crate provides the "front desk" of the liwa system - the agent that:
//! - Forwards guest messages to a hosted chat-completion model
//! - Manages conversation context across a bounded history window
//! - Resolves booking reference codes mentioned earlier in the chat
//! - Executes update/cancel tool calls against the reservation store
//!
//! # Architecture
//!
//! The agent follows a constrained loop:
//! 1. **Completion** (`llm`) - Send history + tool schemas, get text or a tool call
//! 2. **Reference Resolution** (`conversation`) - Most recent mention wins
//! 3. **Tool Execution** (`orchestrator`) - Validate, reprice, single store write
//! 4. **Response Generation** - Render the stored state back to the guest
//!
//! # Safety Principle
//!
//! The model is strictly a translator. It NEVER decides prices, capacity, or
//! whether an update is allowed. Those are deterministic decisions made by the
//! validation and pricing engines, applied to whatever the tool call carries.

pub mod conversation;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod tools;

pub use conversation::{ConversationContext, Speaker, Turn};
pub use llm::{
    ChatMessage, ChatRequest, CompletionClient, CompletionError, CompletionOutcome, MistralClient,
};
pub use orchestrator::{AgentError, ChatOrchestrator};
pub use tools::{tool_schemas, CancelBookingArgs, ToolInvocation, ToolParseError};
