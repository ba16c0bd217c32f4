//! System instructions and seed messages for the two agents.

use dataagent_storage::SchemaSnapshot;

use crate::message::ChatMessage;

/// Instruction for the user-facing agent. The schema is appended at startup.
pub const CHAT_AGENT_PROMPT: &str = "Your job is to help the user find data in a SQLite database using the configured tools.
When the user asks for general information or insights, you should answer this by producing and running a SQLite query.
Do not provide general guidance if you can instead make a query.";

/// Instruction for the translation agent. Its reply is executed verbatim.
pub const SQL_AGENT_PROMPT: &str = "Output a valid SQLite query.
If the input is already valid, just output it back with no other text or formatting.
Your output will be immediately executed in SQLite so it must not contain anything besides a valid query.";

/// First user turn of the chat history. Without it the model tends to start
/// querying before the user has said anything.
pub const SEED_USER_MESSAGE: &str = "Hi";

/// Chat agent instruction with the schema snapshot embedded verbatim.
pub fn chat_system_prompt(schema: &SchemaSnapshot) -> String {
    format!(
        "{}\nHere is the database schema with tables and columns: \n{}",
        CHAT_AGENT_PROMPT,
        schema.as_text()
    )
}

pub fn chat_agent_seed(schema: &SchemaSnapshot) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(chat_system_prompt(schema)),
        ChatMessage::user(SEED_USER_MESSAGE),
    ]
}

pub fn sql_agent_seed() -> Vec<ChatMessage> {
    vec![ChatMessage::system(SQL_AGENT_PROMPT)]
}
