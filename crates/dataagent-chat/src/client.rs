//! Chat-completion client abstraction.
//!
//! `ModelClient` is the seam between the conversation loop and the language
//! model service. `OpenAiClient` talks to Azure OpenAI or any
//! OpenAI-compatible endpoint over HTTP; `ScriptedModelClient` replays canned
//! responses for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use dataagent_core::config::{ApiFlavor, ModelConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::message::{ChatMessage, ToolCall, ToolDefinition};

/// One chat-completion call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub message: ResponseMessage,
}

impl Choice {
    /// Requested tool calls, empty when there are none.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.message.tool_calls.as_deref().unwrap_or_default()
    }

    /// True when the model stopped to have capabilities resolved.
    pub fn wants_tools(&self) -> bool {
        self.finish_reason == Some(FinishReason::ToolCalls) && !self.tool_calls().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl CompletionResponse {
    /// A single plain answer.
    pub fn stop(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                finish_reason: Some(FinishReason::Stop),
                message: ResponseMessage {
                    content: Some(content.into()),
                    tool_calls: None,
                },
            }],
        }
    }

    /// A single choice asking for the given tool calls.
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            choices: vec![Choice {
                finish_reason: Some(FinishReason::ToolCalls),
                message: ResponseMessage {
                    content: None,
                    tool_calls: Some(calls),
                },
            }],
        }
    }
}

/// Language model boundary.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<CompletionResponse, ChatError>;
}

enum Auth {
    ApiKey(String),
    Bearer(String),
}

/// HTTP client for Azure OpenAI and OpenAI-compatible chat completions.
///
/// No request timeout is set; a slow model blocks the conversation.
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    auth: Auth,
}

impl OpenAiClient {
    pub fn from_config(config: &ModelConfig) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder().build()?;
        let base = config.endpoint.trim_end_matches('/');

        let (url, auth) = match config.api_flavor {
            ApiFlavor::Azure => (
                format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    base, config.deployment, config.api_version
                ),
                Auth::ApiKey(config.api_key.clone()),
            ),
            ApiFlavor::OpenAi => (
                format!("{}/chat/completions", base),
                Auth::Bearer(config.api_key.clone()),
            ),
        };

        debug!(url = %url, flavor = ?config.api_flavor, "Model client configured");
        Ok(Self { http, url, auth })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<CompletionResponse, ChatError> {
        let builder = self.http.post(&self.url).json(request);
        let builder = match &self.auth {
            Auth::ApiKey(key) => builder.header("api-key", key),
            Auth::Bearer(key) => builder.bearer_auth(key),
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, "Chat completion request failed");
            return Err(ChatError::Model(format!("HTTP {}: {}", status, body)));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        debug!(choices = parsed.choices.len(), "Chat completion received");
        Ok(parsed)
    }
}

/// What a `ScriptedModelClient` saw in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    /// Names of the advertised tools.
    pub tools: Vec<String>,
}

/// Model client that replays a fixed script and records every request.
///
/// Returns a `Model` error once the script runs out.
#[derive(Default)]
pub struct ScriptedModelClient {
    script: Mutex<VecDeque<Result<CompletionResponse, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModelClient {
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response.
    pub fn push(&self, response: CompletionResponse) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response));
        }
    }

    /// Queue a transport failure.
    pub fn push_error(&self, message: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(message.into()));
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<CompletionResponse, ChatError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                model: request.model.to_string(),
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                messages: request.messages.to_vec(),
                tools: request
                    .tools
                    .iter()
                    .map(|t| t.function.name.clone())
                    .collect(),
            });
        }

        let next = self
            .script
            .lock()
            .map_err(|e| ChatError::Model(format!("Script mutex poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ChatError::Model(message)),
            None => Err(ChatError::Model("script exhausted".to_string())),
        }
    }
}
