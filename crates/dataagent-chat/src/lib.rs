//! Conversational interface for DataAgent.
//!
//! Drives a chat model that can call one capability, `generate_sql_query`.
//! Each call is translated to SQL by a second, narrowly prompted agent,
//! executed against the database, and fed back to the chat model as a
//! tool result.

pub mod agent;
pub mod capability;
pub mod client;
pub mod console;
pub mod conversation;
pub mod error;
pub mod history;
pub mod message;
pub mod prompts;
pub mod translator;

pub use agent::{Agent, AgentConfig};
pub use capability::{Capability, GenerateSqlQueryArgs, GENERATE_SQL_QUERY};
pub use client::{
    Choice, CompletionRequest, CompletionResponse, FinishReason, ModelClient, OpenAiClient,
    RecordedRequest, ResponseMessage, ScriptedModelClient,
};
pub use console::{Console, ScriptedConsole, StdConsole};
pub use conversation::{ConversationLoop, LoopState};
pub use error::{ChatError, ContractViolation};
pub use history::ConversationHistory;
pub use message::{ChatMessage, FunctionCall, Role, ToolCall, ToolDefinition};
pub use translator::SqlTranslator;
