//! Semantic request to SQL translation.

use tracing::{debug, warn};

use crate::agent::{Agent, AgentConfig};
use crate::client::ModelClient;
use crate::error::ChatError;
use crate::history::ConversationHistory;
use crate::message::ChatMessage;
use crate::prompts::sql_agent_seed;

/// Second agent that turns a semantic request into one SQL statement.
///
/// Its history only ever gains user turns: the system prompt, then one
/// message per request. Its own replies are not recorded, so earlier
/// requests stay visible but earlier queries do not.
#[derive(Debug)]
pub struct SqlTranslator {
    agent: Agent,
}

impl SqlTranslator {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            agent: Agent::new(config, sql_agent_seed()),
        }
    }

    /// Translate a request into query text, returned exactly as the model
    /// wrote it.
    ///
    /// A null or blank reply is returned as-is; the executor degrades it to an
    /// empty result like any other unusable query.
    pub async fn translate<C: ModelClient + ?Sized>(
        &mut self,
        client: &C,
        semantic_request: &str,
    ) -> Result<String, ChatError> {
        self.agent.append(ChatMessage::user(semantic_request));

        let choice = self.agent.invoke(client).await?;
        let query = choice.message.content.unwrap_or_default();

        if query.trim().is_empty() {
            warn!(request = %semantic_request, "Translation agent returned no query");
        } else {
            debug!(request = %semantic_request, query = %query, "Request translated");
        }
        Ok(query)
    }

    pub fn history(&self) -> &ConversationHistory {
        self.agent.history()
    }
}
