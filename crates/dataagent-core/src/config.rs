use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DataAgentError, Result};

/// Environment variable overriding `model.api_key`.
pub const ENV_OAI_KEY: &str = "DATAAGENT_OAI_KEY";
/// Environment variable overriding `model.endpoint`.
pub const ENV_OAI_ENDPOINT: &str = "DATAAGENT_OAI_ENDPOINT";
/// Environment variable overriding `model.deployment`.
pub const ENV_OAI_DEPLOYMENT: &str = "DATAAGENT_OAI_DEPLOYMENT";
/// Environment variable overriding `database.connection_string`.
pub const ENV_CONNECTION_STRING: &str = "DATAAGENT_CONNECTION_STRING";

/// Top-level configuration for DataAgent.
///
/// Loaded from `~/.dataagent/config.toml` by default. The model and database
/// sections carry the required inputs; the two agent sections tune sampling
/// for the chat agent and the SQL translation agent independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataAgentConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub chat_agent: ChatAgentConfig,
    #[serde(default)]
    pub sql_agent: SqlAgentConfig,
}

impl DataAgentConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed. Environment
    /// overrides are not applied here; see [`DataAgentConfig::apply_env_overrides`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DataAgentConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration if the file exists.
    ///
    /// A missing file yields `Ok(None)` so the caller can fall back to
    /// defaults plus environment overrides. A file that exists but cannot be
    /// read or parsed is an error; it is never silently replaced by defaults.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        match std::fs::metadata(path) {
            Ok(_) => Self::load(path).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `DATAAGENT_*` environment variables on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a value from the file.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_OAI_KEY) {
            self.model.api_key = v;
        }
        if let Some(v) = get(ENV_OAI_ENDPOINT) {
            self.model.endpoint = v;
        }
        if let Some(v) = get(ENV_OAI_DEPLOYMENT) {
            self.model.deployment = v;
        }
        if let Some(v) = get(ENV_CONNECTION_STRING) {
            self.database.connection_string = v;
        }
    }

    /// Check that every required input is present.
    ///
    /// The first missing value is reported as a `Config` error.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("model.api_key", &self.model.api_key),
            ("model.endpoint", &self.model.endpoint),
            ("model.deployment", &self.model.deployment),
            ("database.connection_string", &self.database.connection_string),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(DataAgentError::Config(format!(
                    "{} not found in configuration",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Which HTTP dialect the model endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// Azure OpenAI: deployment in the URL path, `api-key` header.
    #[default]
    Azure,
    /// OpenAI-compatible: `/chat/completions`, bearer token, model in the body.
    OpenAi,
}

/// Language model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the model service.
    pub endpoint: String,
    /// API key for the model service.
    pub api_key: String,
    /// Deployment (Azure) or model (OpenAI) name used by both agents.
    pub deployment: String,
    pub api_flavor: ApiFlavor,
    /// Azure `api-version` query parameter.
    pub api_version: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_flavor: ApiFlavor::Azure,
            api_version: "2024-02-01".to_string(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path or `file:` URI.
    pub connection_string: String,
}

/// What the conversation loop does when the model breaks the capability contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    /// Stop the loop and surface the violation to the caller.
    #[default]
    Abort,
    /// Hand the violation back to the model as the tool result and continue.
    Report,
}

/// Sampling settings for the user-facing chat agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatAgentConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub on_contract_violation: ViolationPolicy,
}

impl Default for ChatAgentConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 2000,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            on_contract_violation: ViolationPolicy::Abort,
        }
    }
}

/// Sampling settings for the SQL translation agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlAgentConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for SqlAgentConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 800,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn complete_config() -> DataAgentConfig {
        let mut config = DataAgentConfig::default();
        config.model.api_key = "key".to_string();
        config.model.endpoint = "https://example.openai.azure.com".to_string();
        config.model.deployment = "gpt-4o".to_string();
        config.database.connection_string = "data.db".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = DataAgentConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.model.api_flavor, ApiFlavor::Azure);
        assert_eq!(config.model.api_version, "2024-02-01");
        assert!(config.model.api_key.is_empty());
        assert_eq!(config.chat_agent.max_tokens, 2000);
        assert_eq!(config.chat_agent.temperature, 0.0);
        assert_eq!(config.chat_agent.on_contract_violation, ViolationPolicy::Abort);
        assert_eq!(config.sql_agent.max_tokens, 800);
        assert_eq!(config.sql_agent.temperature, 0.0);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[model]
endpoint = "https://example.openai.azure.com"
api_key = "secret"
deployment = "gpt-4o"
api_flavor = "openai"

[database]
connection_string = "/var/lib/shop.db"

[chat_agent]
max_tokens = 1500
on_contract_violation = "report"

[sql_agent]
max_tokens = 400
frequency_penalty = 0.5
"#;
        let file = create_temp_config(content);
        let config = DataAgentConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.model.api_key, "secret");
        assert_eq!(config.model.api_flavor, ApiFlavor::OpenAi);
        assert_eq!(config.database.connection_string, "/var/lib/shop.db");
        assert_eq!(config.chat_agent.max_tokens, 1500);
        assert_eq!(config.chat_agent.on_contract_violation, ViolationPolicy::Report);
        assert_eq!(config.sql_agent.max_tokens, 400);
        assert!((config.sql_agent.frequency_penalty - 0.5).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[model]
deployment = "gpt-35-turbo"
"#;
        let file = create_temp_config(content);
        let config = DataAgentConfig::load(file.path()).unwrap();
        assert_eq!(config.model.deployment, "gpt-35-turbo");
        assert_eq!(config.model.api_version, "2024-02-01");
        assert_eq!(config.chat_agent.max_tokens, 2000);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = DataAgentConfig::load(file.path());
        assert!(matches!(result, Err(DataAgentError::Config(_))));
    }

    #[test]
    fn test_load_if_exists_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = DataAgentConfig::load_if_exists(&dir.path().join("config.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_if_exists_reports_malformed_file() {
        let file = create_temp_config("[model]\napi_key = ");
        let err = DataAgentConfig::load_if_exists(file.path()).unwrap_err();
        assert!(matches!(err, DataAgentError::Config(_)));
    }

    #[test]
    fn test_load_if_exists_reads_present_file() {
        let file = create_temp_config("[database]\nconnection_string = \"shop.db\"\n");
        let config = DataAgentConfig::load_if_exists(file.path()).unwrap().unwrap();
        assert_eq!(config.database.connection_string, "shop.db");
        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_validate_reports_first_missing_value() {
        let mut config = complete_config();
        config.model.api_key = String::new();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: model.api_key not found in configuration"
        );

        let mut config = complete_config();
        config.database.connection_string = "   ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database.connection_string"));
    }

    #[test]
    fn test_validate_complete_config() {
        assert!(complete_config().validate().is_ok());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_OAI_KEY, "env-key"),
            (ENV_OAI_ENDPOINT, "https://env.example.com"),
            (ENV_OAI_DEPLOYMENT, "env-deployment"),
            (ENV_CONNECTION_STRING, "env.db"),
        ]
        .into_iter()
        .collect();

        let mut config = DataAgentConfig::default();
        config.apply_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.model.api_key, "env-key");
        assert_eq!(config.model.endpoint, "https://env.example.com");
        assert_eq!(config.model.deployment, "env-deployment");
        assert_eq!(config.database.connection_string, "env.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let mut config = complete_config();
        config.apply_overrides_from(|k| {
            if k == ENV_OAI_KEY {
                Some("  ".to_string())
            } else {
                None
            }
        });
        assert_eq!(config.model.api_key, "key");
    }
}
