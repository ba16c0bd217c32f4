//! The capability registry: what the chat model may ask the host to do.
//!
//! Only one capability exists. Tool calls are parsed into the typed
//! `Capability` enum at the boundary, and anything that does not fit is a
//! `ContractViolation`.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ContractViolation;
use crate::message::{ToolCall, ToolDefinition};

/// Name of the generate-and-run-SQL capability.
pub const GENERATE_SQL_QUERY: &str = "generate_sql_query";

/// Arguments of `generate_sql_query`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSqlQueryArgs {
    /// Natural-language description of the data wanted.
    pub semantic_request: String,
}

/// A validated capability invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    GenerateSqlQuery(GenerateSqlQueryArgs),
}

impl Capability {
    /// Validate a tool call against the registry.
    pub fn parse(call: &ToolCall) -> Result<Self, ContractViolation> {
        match call.function.name.as_str() {
            GENERATE_SQL_QUERY => {
                let args = parse_object::<GenerateSqlQueryArgs>(
                    GENERATE_SQL_QUERY,
                    &call.function.arguments,
                )?;
                Ok(Capability::GenerateSqlQuery(args))
            }
            other => Err(ContractViolation::UnknownCapability {
                name: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Capability::GenerateSqlQuery(_) => GENERATE_SQL_QUERY,
        }
    }
}

/// Decode an argument payload that must be a JSON object.
///
/// Derived struct deserializers also accept a positional array, so the shape
/// is checked on the raw value first.
fn parse_object<T: DeserializeOwned>(
    capability: &str,
    arguments: &str,
) -> Result<T, ContractViolation> {
    let malformed = |reason: String| ContractViolation::MalformedArguments {
        capability: capability.to_string(),
        reason,
    };

    let value: Value = serde_json::from_str(arguments).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("arguments must be a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// Tool definitions advertised to the chat model.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition::function(
        GENERATE_SQL_QUERY,
        "Generate a SQLite query based on input from the user and run it",
        json!({
            "type": "object",
            "properties": {
                "semanticRequest": {
                    "type": "string",
                    "description": "Semantic query that will be converted to a SQLite query"
                }
            },
            "required": ["semanticRequest"]
        }),
    )]
}
