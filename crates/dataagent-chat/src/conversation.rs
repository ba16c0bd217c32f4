//! The conversation loop.
//!
//! A small state machine drives the chat agent:
//!
//! - `AwaitModel`: one chat-model call. A tool-call response moves to
//!   `ResolveCapabilities`; anything else is shown to the user and moves to
//!   `AwaitUser`.
//! - `ResolveCapabilities`: every requested call is resolved, in order, before
//!   the placeholder and the tool results are appended together. Then back to
//!   `AwaitModel` without reading input.
//! - `AwaitUser`: one line of input is appended as a user turn, or end of
//!   input moves to `Finished`.
//!
//! A failed step leaves the loop `Finished`; nothing is retried.

use std::mem;

use dataagent_core::config::ViolationPolicy;
use dataagent_storage::{to_delimited_text, QueryExecutor};
use tracing::{debug, error, info, warn};

use crate::agent::Agent;
use crate::capability::Capability;
use crate::client::{FinishReason, ModelClient};
use crate::console::Console;
use crate::error::ChatError;
use crate::history::ConversationHistory;
use crate::message::{ChatMessage, ToolCall};
use crate::translator::SqlTranslator;

/// Where the loop is between steps.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitModel,
    ResolveCapabilities {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
    AwaitUser,
    Finished,
}

/// Chat agent, translation agent, executor and console wired together.
pub struct ConversationLoop<C, E, U> {
    chat: Agent,
    translator: SqlTranslator,
    client: C,
    executor: E,
    console: U,
    policy: ViolationPolicy,
    state: LoopState,
}

impl<C, E, U> ConversationLoop<C, E, U>
where
    C: ModelClient,
    E: QueryExecutor,
    U: Console,
{
    /// `chat` should already hold its seed messages. Starts in `AwaitModel`.
    pub fn new(chat: Agent, translator: SqlTranslator, client: C, executor: E, console: U) -> Self {
        Self {
            chat,
            translator,
            client,
            executor,
            console,
            policy: ViolationPolicy::default(),
            state: LoopState::AwaitModel,
        }
    }

    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run until end of input or the first fatal error.
    pub async fn run(&mut self) -> Result<(), ChatError> {
        info!(policy = ?self.policy, "Conversation started");
        loop {
            if *self.step().await? == LoopState::Finished {
                info!(messages = self.chat.messages().len(), "Conversation finished");
                return Ok(());
            }
        }
    }

    /// Perform exactly one transition.
    pub async fn step(&mut self) -> Result<&LoopState, ChatError> {
        let next = match mem::replace(&mut self.state, LoopState::Finished) {
            LoopState::AwaitModel => self.await_model().await?,
            LoopState::ResolveCapabilities { content, calls } => {
                self.resolve_turn(content, calls).await?
            }
            LoopState::AwaitUser => self.await_user()?,
            LoopState::Finished => LoopState::Finished,
        };
        self.state = next;
        Ok(&self.state)
    }

    async fn await_model(&mut self) -> Result<LoopState, ChatError> {
        let choice = self.chat.invoke(&self.client).await?;

        if choice.wants_tools() {
            let calls = choice.message.tool_calls.unwrap_or_default();
            debug!(calls = calls.len(), "Model requested capabilities");
            return Ok(LoopState::ResolveCapabilities {
                content: choice.message.content,
                calls,
            });
        }

        match choice.finish_reason {
            Some(FinishReason::ToolCalls) => {
                warn!("Model signalled tool calls but sent none; treating as an answer")
            }
            Some(FinishReason::Length) => warn!("Model reply was cut off at max_tokens"),
            Some(FinishReason::ContentFilter) => warn!("Model reply was filtered"),
            _ => {}
        }

        let text = choice.message.content.unwrap_or_default();
        self.chat.append(ChatMessage::assistant(text.clone()));
        self.console.show_assistant(&text)?;
        Ok(LoopState::AwaitUser)
    }

    async fn resolve_turn(
        &mut self,
        content: Option<String>,
        calls: Vec<ToolCall>,
    ) -> Result<LoopState, ChatError> {
        let mut results = Vec::with_capacity(calls.len());

        for call in &calls {
            let output = match Capability::parse(call) {
                Ok(capability) => self.resolve(capability).await?,
                Err(violation) => match self.policy {
                    ViolationPolicy::Abort => {
                        error!(
                            call_id = %call.id,
                            violation = %violation,
                            "Capability contract violated"
                        );
                        return Err(violation.into());
                    }
                    ViolationPolicy::Report => {
                        warn!(
                            call_id = %call.id,
                            violation = %violation,
                            "Reporting contract violation to the model"
                        );
                        format!("error: {}", violation)
                    }
                },
            };
            results.push(ChatMessage::tool_result(call.id.clone(), output));
        }

        self.chat
            .append(ChatMessage::assistant_with_tool_calls(content, calls));
        for result in results {
            self.chat.append(result);
        }
        Ok(LoopState::AwaitModel)
    }

    async fn resolve(&mut self, capability: Capability) -> Result<String, ChatError> {
        debug!(capability = capability.name(), "Resolving capability");
        match capability {
            Capability::GenerateSqlQuery(args) => {
                let query = self
                    .translator
                    .translate(&self.client, &args.semantic_request)
                    .await?;
                let result = self.executor.execute(&query);
                info!(
                    columns = result.columns().len(),
                    rows = result.rows().len(),
                    "Query resolved"
                );
                Ok(to_delimited_text(&result))
            }
        }
    }

    fn await_user(&mut self) -> Result<LoopState, ChatError> {
        match self.console.read_user()? {
            Some(line) => {
                self.chat.append(ChatMessage::user(line));
                Ok(LoopState::AwaitModel)
            }
            None => {
                info!("End of input");
                Ok(LoopState::Finished)
            }
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// The chat agent's history.
    pub fn history(&self) -> &ConversationHistory {
        self.chat.history()
    }

    pub fn translator(&self) -> &SqlTranslator {
        &self.translator
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn console(&self) -> &U {
        &self.console
    }
}
