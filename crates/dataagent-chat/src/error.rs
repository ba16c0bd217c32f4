//! Error types for the conversational interface.

/// The model asked for something outside the registered capability contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("unknown capability '{name}'")]
    UnknownCapability { name: String },
    #[error("malformed arguments for '{capability}': {reason}")]
    MalformedArguments { capability: String, reason: String },
}

/// Errors from the chat engine.
///
/// Query failures never show up here: the executor degrades them to an
/// empty result before they reach the loop.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("capability contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),
    #[error("LLM error: {0}")]
    Model(String),
    #[error("model returned no choices")]
    EmptyResponse,
    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// True for errors caused by the model breaking the capability contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ChatError::ContractViolation(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::Model(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Model(format!("invalid response payload: {}", err))
    }
}
