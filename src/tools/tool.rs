//! Tool type and JSON-schema derivation for handler inputs.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ChatError;

/// Error type tool handlers may return.
pub type ToolHandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Internal adapter: raw JSON argument string in, textual result out.
type ArgumentAdapter = dyn Fn(&str) -> Result<String, String> + Send + Sync;

/// A callable tool exposed to the model.
///
/// Holds a stable id, a human description, the JSON schema of the handler's
/// input type (derived once at creation and cached), and the typed handler
/// behind a JSON-parsing adapter. Handlers run synchronously during
/// dispatch; ordering across a round's calls is deterministic.
#[derive(Clone)]
pub struct Tool {
    /// Registry key of the tool. May be rewritten on insertion when the
    /// registry resolves an id collision or an override.
    pub id: String,
    /// Human-readable description passed to the provider.
    pub description: String,
    schema: Map<String, Value>,
    handler: Arc<ArgumentAdapter>,
}

impl Tool {
    /// Create a tool from a typed handler.
    ///
    /// The JSON schema is derived from `I`. Input types whose schema is not
    /// a JSON object (strings, numbers, arrays, …) are wrapped as a single
    /// required `input` field, and dispatch then expects
    /// `{"input": <value>}`; object-shaped inputs are consumed directly.
    pub fn new<I, F>(
        id: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Result<Self, ChatError>
    where
        I: DeserializeOwned + JsonSchema + 'static,
        F: Fn(I) -> Result<String, ToolHandlerError> + Send + Sync + 'static,
    {
        let id = id.into();
        let (schema, wrapped) = derive_schema::<I>(&id)?;

        let type_name = std::any::type_name::<I>();
        let adapter = move |raw: &str| -> Result<String, String> {
            let mut value: Value = serde_json::from_str(raw)
                .map_err(|err| format!("unmarshal into {type_name}: {err}"))?;
            if wrapped {
                value = value
                    .get_mut("input")
                    .map(Value::take)
                    .unwrap_or(Value::Null);
            }
            let input: I = serde_json::from_value(value)
                .map_err(|err| format!("unmarshal into {type_name}: {err}"))?;
            handler(input).map_err(|err| err.to_string())
        };

        Ok(Self {
            id,
            description: description.into(),
            schema,
            handler: Arc::new(adapter),
        })
    }

    /// The cached JSON schema of the handler's input.
    pub fn schema(&self) -> &Map<String, Value> {
        &self.schema
    }

    /// Parse the raw JSON arguments and run the handler.
    pub(crate) fn invoke(&self, arguments: &str) -> Result<String, String> {
        (self.handler)(arguments)
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish()
    }
}

/// Derive the schema map for `I`, wrapping non-object schemas under an
/// `input` field. Returns the map and whether wrapping was applied.
fn derive_schema<I: JsonSchema>(tool_id: &str) -> Result<(Map<String, Value>, bool), ChatError> {
    let root = schemars::schema_for!(I);
    let value = serde_json::to_value(&root).map_err(|err| ChatError::SchemaDerivation {
        tool: tool_id.to_string(),
        detail: err.to_string(),
    })?;
    let Value::Object(mut schema) = value else {
        return Err(ChatError::SchemaDerivation {
            tool: tool_id.to_string(),
            detail: "derived schema is not a JSON object".to_string(),
        });
    };
    schema.remove("$schema");

    if schema.get("type").and_then(Value::as_str) == Some("object") {
        return Ok((schema, false));
    }

    let mut properties = Map::new();
    properties.insert("input".to_string(), Value::Object(schema));
    let mut wrapper = Map::new();
    wrapper.insert("type".to_string(), Value::String("object".to_string()));
    wrapper.insert("properties".to_string(), Value::Object(properties));
    wrapper.insert(
        "required".to_string(),
        Value::Array(vec![Value::String("input".to_string())]),
    );
    Ok((wrapper, true))
}
