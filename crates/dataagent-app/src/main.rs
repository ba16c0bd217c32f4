//! DataAgent binary - composition root.
//!
//! 1. Resolve and load configuration (file, then env, then CLI flags);
//!    a config file that exists but does not parse is fatal
//! 2. Validate required inputs before any conversation starts
//! 3. Snapshot the database schema into the chat agent's system prompt
//! 4. Run the conversation on stdin/stdout; logs go to stderr

mod cli;

use clap::Parser;
use tracing::{error, info};

use dataagent_chat::prompts::chat_agent_seed;
use dataagent_chat::{Agent, AgentConfig, ConversationLoop, OpenAiClient, SqlTranslator, StdConsole};
use dataagent_core::config::{DataAgentConfig, GeneralConfig};
use dataagent_storage::{Database, SchemaSnapshot, SqliteExecutor};

use cli::CliArgs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before tracing starts so its log level can apply.
    // Any load error is reported once the subscriber is installed.
    let config_file = args.resolve_config_path();
    let loaded = DataAgentConfig::load_if_exists(&config_file);
    let configured_level = match &loaded {
        Ok(Some(config)) => config.general.log_level.clone(),
        _ => GeneralConfig::default().log_level,
    };
    let log_level = args.resolve_log_level(&configured_level);

    // Tracing on stderr, away from the transcript.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    info!("Starting DataAgent v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(Some(config)) => {
            info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Ok(None) => {
            info!(
                path = %config_file.display(),
                "No configuration file; using defaults and environment"
            );
            DataAgentConfig::default()
        }
        Err(e) => {
            error!(path = %config_file.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    config.apply_env_overrides();
    if let Some(database) = args.resolve_database() {
        config.database.connection_string = database;
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Storage.
    let executor = SqliteExecutor::new(Database::new(config.database.connection_string.clone()));
    let schema = SchemaSnapshot::load(&executor);

    // Agents.
    let deployment = config.model.deployment.clone();
    let chat = Agent::new(
        AgentConfig::chat(deployment.clone(), &config.chat_agent),
        chat_agent_seed(&schema),
    );
    let translator = SqlTranslator::new(AgentConfig::sql(deployment, &config.sql_agent));
    let client = OpenAiClient::from_config(&config.model)?;
    info!(url = %client.url(), "Model client ready");

    let mut conversation =
        ConversationLoop::new(chat, translator, client, executor, StdConsole::stdio())
            .with_violation_policy(config.chat_agent.on_contract_violation);

    if let Err(e) = conversation.run().await {
        if e.is_contract_violation() {
            error!(error = %e, "Model broke the capability contract; stopping");
        } else {
            error!(error = %e, "Conversation failed");
        }
        return Err(e.into());
    }

    info!("Goodbye");
    Ok(())
}
