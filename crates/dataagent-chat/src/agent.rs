//! A model-backed agent: sampling settings plus its own history.

use dataagent_core::config::{ChatAgentConfig, SqlAgentConfig};
use tracing::debug;

use crate::capability::tool_definitions;
use crate::client::{Choice, CompletionRequest, ModelClient};
use crate::error::ChatError;
use crate::history::ConversationHistory;
use crate::message::{ChatMessage, ToolDefinition};

/// Per-agent request settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Deployment or model name sent with every request.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    /// Capabilities advertised to the model. Empty for the SQL agent.
    pub tools: Vec<ToolDefinition>,
}

impl AgentConfig {
    /// Settings for the user-facing chat agent, with the capability registry attached.
    pub fn chat(model: impl Into<String>, config: &ChatAgentConfig) -> Self {
        Self {
            model: model.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            tools: tool_definitions(),
        }
    }

    /// Settings for the SQL translation agent. It gets no tools.
    pub fn sql(model: impl Into<String>, config: &SqlAgentConfig) -> Self {
        Self {
            model: model.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            presence_penalty: config.presence_penalty,
            frequency_penalty: config.frequency_penalty,
            tools: Vec::new(),
        }
    }
}

/// An agent owns its history exclusively; nothing else appends to it.
#[derive(Debug)]
pub struct Agent {
    config: AgentConfig,
    history: ConversationHistory,
}

impl Agent {
    pub fn new(config: AgentConfig, seed: impl IntoIterator<Item = ChatMessage>) -> Self {
        Self {
            config,
            history: ConversationHistory::seeded(seed),
        }
    }

    pub fn append(&mut self, message: ChatMessage) {
        self.history.append(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.history.messages()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Send the full history and return the first choice.
    pub async fn invoke<C: ModelClient + ?Sized>(&self, client: &C) -> Result<Choice, ChatError> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: self.history.messages(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            presence_penalty: self.config.presence_penalty,
            frequency_penalty: self.config.frequency_penalty,
            tools: &self.config.tools,
        };

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Invoking model"
        );

        let response = client.complete(&request).await?;
        response
            .choices
            .into_iter()
            .next()
            .ok_or(ChatError::EmptyResponse)
    }
}
