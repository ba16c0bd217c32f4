//! End-to-end conversation runs against a real SQLite database.

use dataagent_chat::prompts::chat_agent_seed;
use dataagent_chat::{
    Agent, AgentConfig, ChatError, ChatMessage, CompletionResponse, ConversationLoop, Role,
    ScriptedConsole, ScriptedModelClient, SqlTranslator, ToolCall, GENERATE_SQL_QUERY,
};
use dataagent_core::config::{ChatAgentConfig, SqlAgentConfig, ViolationPolicy};
use dataagent_storage::{Database, SchemaSnapshot, SqliteExecutor};
use rusqlite::Connection;
use tempfile::TempDir;

type ShopLoop = ConversationLoop<ScriptedModelClient, SqliteExecutor, ScriptedConsole>;

fn create_shop(dir: &TempDir) -> SqliteExecutor {
    let path = dir.path().join("shop.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE Users (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL);
         CREATE TABLE Orders (Id INTEGER PRIMARY KEY, UserId INTEGER, Total REAL);
         INSERT INTO Users (Id, Name) VALUES (1, 'Ada'), (2, 'Linus');
         INSERT INTO Orders (Id, UserId, Total) VALUES (1, 1, 12.5), (2, 2, 3.0), (3, 1, 40.25);",
    )
    .unwrap();
    SqliteExecutor::new(Database::new(path.to_string_lossy().to_string()))
}

fn build(
    executor: SqliteExecutor,
    script: Vec<CompletionResponse>,
    inputs: &[&str],
    policy: ViolationPolicy,
) -> ShopLoop {
    let schema = SchemaSnapshot::load(&executor);
    let chat = Agent::new(
        AgentConfig::chat("gpt-4o", &ChatAgentConfig::default()),
        chat_agent_seed(&schema),
    );
    let translator = SqlTranslator::new(AgentConfig::sql("gpt-4o", &SqlAgentConfig::default()));
    ConversationLoop::new(
        chat,
        translator,
        ScriptedModelClient::new(script),
        executor,
        ScriptedConsole::new(inputs.iter().copied()),
    )
    .with_violation_policy(policy)
}

fn sql_call(id: &str, request: &str) -> ToolCall {
    ToolCall::function(
        id,
        GENERATE_SQL_QUERY,
        serde_json::json!({ "semanticRequest": request }).to_string(),
    )
}

fn tool_results(messages: &[ChatMessage]) -> Vec<&ChatMessage> {
    messages.iter().filter(|m| m.role == Role::Tool).collect()
}

#[tokio::test]
async fn test_full_session_queries_real_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut convo = build(
        create_shop(&dir),
        vec![
            CompletionResponse::stop("Hello! What would you like to know?"),
            CompletionResponse::tool_calls(vec![sql_call("call_1", "total spent per user")]),
            CompletionResponse::stop(
                "SELECT u.Name, SUM(o.Total) AS Spent FROM Users u JOIN Orders o ON o.UserId = u.Id GROUP BY u.Name ORDER BY u.Name;",
            ),
            CompletionResponse::stop("Ada spent 52.75 and Linus spent 3."),
        ],
        &["How much has each user spent?"],
        ViolationPolicy::Abort,
    );

    convo.run().await.unwrap();

    let messages = convo.history().messages();
    assert!(messages[0]
        .text()
        .ends_with("TABLE_NAME,COLUMN_NAME\nOrders,Id\nOrders,UserId\nOrders,Total\nUsers,Id\nUsers,Name"));
    assert_eq!(messages[1].text(), "Hi");

    let results = tool_results(messages);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(results[0].text(), "Name,Spent\nAda,52.75\nLinus,3");

    assert_eq!(
        convo.console().shown(),
        [
            "Hello! What would you like to know?".to_string(),
            "Ada spent 52.75 and Linus spent 3.".to_string(),
        ]
    );
    assert_eq!(convo.console().reads(), 2);

    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Assistant,
        ]
    );
}

#[tokio::test]
async fn test_invalid_sql_degrades_to_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut convo = build(
        create_shop(&dir),
        vec![
            CompletionResponse::tool_calls(vec![sql_call("call_1", "list all invoices")]),
            CompletionResponse::stop("SELECT * FROM Invoices;"),
            CompletionResponse::stop("I could not find any invoices."),
        ],
        &[],
        ViolationPolicy::Abort,
    );

    convo.run().await.unwrap();

    let results = tool_results(convo.history().messages());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text(), "");
    assert_eq!(
        convo.console().shown(),
        ["I could not find any invoices.".to_string()]
    );
}

#[tokio::test]
async fn test_blank_translation_degrades_to_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut convo = build(
        create_shop(&dir),
        vec![
            CompletionResponse::tool_calls(vec![sql_call("call_1", "something unclear")]),
            CompletionResponse::stop("  \n"),
            CompletionResponse::stop("I could not work that out."),
        ],
        &[],
        ViolationPolicy::Abort,
    );

    convo.run().await.unwrap();

    let results = tool_results(convo.history().messages());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].text(), "");
    assert_eq!(
        convo.console().shown(),
        ["I could not work that out.".to_string()]
    );
}

#[tokio::test]
async fn test_unknown_capability_aborts_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut convo = build(
        create_shop(&dir),
        vec![CompletionResponse::tool_calls(vec![ToolCall::function(
            "call_1",
            "delete_user",
            r#"{"id":1}"#,
        )])],
        &[],
        ViolationPolicy::Abort,
    );
    let before = convo.history().len();

    let err = convo.run().await.unwrap_err();
    assert!(err.is_contract_violation());
    assert_eq!(convo.history().len(), before);

    // The database is untouched.
    let users = convo
        .executor()
        .try_execute("SELECT COUNT(*) AS N FROM Users;")
        .unwrap();
    assert_eq!(users.rows()[0][0].to_string(), "2");
}

#[tokio::test]
async fn test_report_policy_lets_model_recover() {
    let dir = tempfile::tempdir().unwrap();
    let mut convo = build(
        create_shop(&dir),
        vec![
            CompletionResponse::tool_calls(vec![ToolCall::function(
                "call_1",
                GENERATE_SQL_QUERY,
                r#"{"semantic_request":"count users"}"#,
            )]),
            CompletionResponse::tool_calls(vec![sql_call("call_2", "count users")]),
            CompletionResponse::stop("SELECT COUNT(*) AS Users FROM Users;"),
            CompletionResponse::stop("There are 2 users."),
        ],
        &[],
        ViolationPolicy::Report,
    );

    convo.run().await.unwrap();

    let results = tool_results(convo.history().messages());
    assert_eq!(results.len(), 2);
    assert!(results[0].text().starts_with("error: malformed arguments for 'generate_sql_query'"));
    assert_eq!(results[1].text(), "Users\n2");

    // Only the valid call reached the translation agent.
    assert_eq!(convo.translator().history().len(), 2);
}

#[tokio::test]
async fn test_model_outage_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut convo = build(create_shop(&dir), Vec::new(), &["hello"], ViolationPolicy::Report);
    convo
        .client()
        .push_error("HTTP 401 Unauthorized: invalid api key");

    let err = convo.run().await.unwrap_err();
    assert!(matches!(err, ChatError::Model(ref m) if m.contains("401")));
    assert!(convo.console().shown().is_empty());
}
