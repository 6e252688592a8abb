//! Tool execution types and structures
//!
//! Core data model for tool definitions, invocation records, and
//! function-calling schema export.

use crate::errors::{Result, ToolError};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Keyword-argument map passed to tool callables
pub type Arguments = Map<String, Value>;

/// JSON Schema type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParameterType {
    /// JSON Schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Integer => "integer",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Array => "array",
            ParameterType::Object => "object",
        }
    }
}

/// One named parameter of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name (must match the callable's keyword)
    pub name: String,

    /// JSON Schema type
    pub param_type: ParameterType,

    /// Parameter description shown to the model
    pub description: String,

    /// Whether the parameter is required
    pub required: bool,

    /// Default value used when the argument is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum constraint: the only values the argument may take
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl ToolParameter {
    /// Create a required parameter
    pub fn required(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
            allowed_values: None,
        }
    }

    /// Create an optional parameter
    pub fn optional(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            default: None,
            allowed_values: None,
        }
    }

    /// Set default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Constrain the argument to a fixed set of values
    pub fn with_allowed_values(mut self, values: Vec<String>) -> Self {
        self.allowed_values = Some(values);
        self
    }

    /// Render this parameter as a JSON Schema property
    pub fn json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(self.param_type.as_str()));
        prop.insert("description".to_string(), json!(self.description));
        if let Some(values) = &self.allowed_values {
            prop.insert("enum".to_string(), json!(values));
        }
        if let Some(default) = &self.default {
            prop.insert("default".to_string(), default.clone());
        }
        Value::Object(prop)
    }
}

/// Tool category for list-by-category lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Filesystem,
    Network,
    Computation,
    Process,
    General,
}

impl ToolCategory {
    /// Category name
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Filesystem => "filesystem",
            ToolCategory::Network => "network",
            ToolCategory::Computation => "computation",
            ToolCategory::Process => "process",
            ToolCategory::General => "general",
        }
    }
}

type SyncCallable = dyn Fn(Arguments) -> Result<Value> + Send + Sync;
type AsyncCallable = dyn Fn(Arguments) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// Tool callable, tagged by calling convention at registration time
///
/// The executor never branches on convention at call time: `invoke`
/// awaits both variants uniformly. Sync bodies run on the blocking
/// worker pool so a CPU-bound tool cannot stall sibling tasks.
#[derive(Clone)]
pub enum ToolHandler {
    Sync(Arc<SyncCallable>),
    Async(Arc<AsyncCallable>),
}

impl ToolHandler {
    /// Wrap a synchronous callable
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value> + Send + Sync + 'static,
    {
        ToolHandler::Sync(Arc::new(f))
    }

    /// Wrap an asynchronous callable
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        ToolHandler::Async(Arc::new(move |args| Box::pin(f(args))))
    }

    /// Invoke the callable with keyword arguments and await the outcome
    pub async fn invoke(&self, args: Arguments) -> Result<Value> {
        match self {
            ToolHandler::Sync(f) => {
                let f = Arc::clone(f);
                tokio::task::spawn_blocking(move || f(args))
                    .await
                    .map_err(|e| ToolError::Generic(format!("Tool task failed: {}", e)))?
            }
            ToolHandler::Async(f) => f(args).await,
        }
    }

    /// Whether the underlying callable is asynchronous
    pub fn is_async(&self) -> bool {
        matches!(self, ToolHandler::Async(_))
    }
}

impl fmt::Debug for ToolHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolHandler::Sync(_) => f.write_str("ToolHandler::Sync"),
            ToolHandler::Async(_) => f.write_str("ToolHandler::Async"),
        }
    }
}

/// Tool definition: schema plus callable
///
/// Owned by the registry; immutable after registration.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description shown to the model
    pub description: String,

    /// Ordered parameter list
    pub parameters: Vec<ToolParameter>,

    /// Category for grouped lookup
    pub category: ToolCategory,

    /// The underlying callable
    pub handler: ToolHandler,
}

impl ToolDefinition {
    /// Create a new tool definition with no parameters
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: ToolCategory,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            category,
            handler,
        }
    }

    /// Append a parameter
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Render the parameter list as a JSON Schema object
    pub fn parameters_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(param.name.clone(), param.json_schema());
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// OpenAI-style function-calling schema
    pub fn to_openai_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }

    /// Anthropic-style function-calling schema
    pub fn to_anthropic_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.parameters_schema(),
        })
    }
}

/// Durable record of one logical tool invocation
///
/// Retries and fallbacks update this record in place; the final state
/// reflects the last attempt (success) or the last attempt's error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call id
    pub id: String,

    /// Tool name as requested by the caller
    pub name: String,

    /// Caller-supplied arguments (pre-sanitization)
    pub arguments: Arguments,

    /// Result value on success
    pub result: Option<Value>,

    /// Error message on failure (`succeeded` iff this is None)
    pub error: Option<String>,

    /// One concrete suggested action, set alongside `error`
    pub suggestion: Option<String>,

    /// Fallback tool that produced the result, if any
    pub fallback_tool: Option<String>,

    /// Number of invocation attempts (retries and fallbacks included)
    pub attempts: u32,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// When the call was started
    pub started_at: DateTime<Utc>,
}

impl ToolCall {
    /// Create a pending call record
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            result: None,
            error: None,
            suggestion: None,
            fallback_tool: None,
            attempts: 0,
            duration_ms: 0,
            started_at: Utc::now(),
        }
    }

    /// Whether the call reached a successful terminal state
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Mark terminal success, clearing any error from earlier attempts
    pub fn mark_success(&mut self, result: Value, duration: Duration) {
        self.result = Some(result);
        self.error = None;
        self.suggestion = None;
        self.duration_ms = duration.as_millis() as u64;
    }

    /// Mark terminal failure
    pub fn mark_failure(
        &mut self,
        error: impl Into<String>,
        suggestion: impl Into<String>,
        duration: Duration,
    ) {
        self.result = None;
        self.error = Some(error.into());
        self.suggestion = Some(suggestion.into());
        self.duration_ms = duration.as_millis() as u64;
    }

    /// Serialize for the surrounding session logger
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "arguments": self.arguments,
            "result": self.result,
            "error": self.error,
            "succeeded": self.succeeded(),
        })
    }
}

/// Ordered batch of tool calls from one `execute_tools` invocation
///
/// Calls appear in caller-supplied order regardless of completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Call records in caller order
    pub calls: Vec<ToolCall>,

    /// Batch wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a batch result
    pub fn new(calls: Vec<ToolCall>, duration: Duration) -> Self {
        Self {
            calls,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Whether every call in the batch succeeded
    pub fn succeeded(&self) -> bool {
        self.calls.iter().all(|call| call.succeeded())
    }

    /// Number of failed calls
    pub fn failed_count(&self) -> usize {
        self.calls.iter().filter(|call| !call.succeeded()).count()
    }

    /// Number of calls in the batch
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Serialize for the surrounding session logger
    pub fn to_json(&self) -> Value {
        json!({
            "calls": self.calls.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            "succeeded": self.succeeded(),
            "failed_count": self.failed_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_tool_call_lifecycle() {
        let mut call = ToolCall::new("read_file", args(&[("path", json!("a.txt"))]));
        assert!(call.succeeded());
        assert!(call.result.is_none());

        call.mark_failure("boom", "retry later", Duration::from_millis(10));
        assert!(!call.succeeded());

        call.mark_success(json!("ok"), Duration::from_millis(25));
        assert!(call.succeeded());
        assert!(call.error.is_none());
        assert_eq!(call.duration_ms, 25);
    }

    #[test]
    fn test_tool_call_to_json() {
        let mut call = ToolCall::new("calculate", args(&[("expression", json!("2+2"))]));
        call.mark_success(json!(4.0), Duration::from_millis(1));

        let value = call.to_json();
        assert_eq!(value["name"], "calculate");
        assert_eq!(value["succeeded"], true);
        assert_eq!(value["result"], 4.0);
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_tool_result_invariant() {
        let mut ok = ToolCall::new("a", Arguments::new());
        ok.mark_success(json!(1), Duration::from_millis(1));
        let mut bad = ToolCall::new("b", Arguments::new());
        bad.mark_failure("nope", "check input", Duration::from_millis(1));

        let result = ToolResult::new(vec![ok, bad], Duration::from_millis(5));
        assert!(!result.succeeded());
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.len(), 2);

        let value = result.to_json();
        assert_eq!(value["failed_count"], 1);
        assert_eq!(value["succeeded"], false);
    }

    #[tokio::test]
    async fn test_sync_handler_invoke() {
        let handler = ToolHandler::sync(|args| {
            let x = args["x"].as_i64().unwrap_or(0);
            Ok(json!(x * 2))
        });

        assert!(!handler.is_async());
        let result = handler.invoke(args(&[("x", json!(21))])).await.unwrap();
        assert_eq!(result, json!(42));
    }

    #[tokio::test]
    async fn test_async_handler_invoke() {
        let handler = ToolHandler::async_fn(|args| async move {
            let x = args["x"].as_i64().unwrap_or(0);
            Ok(json!(x + 1))
        });

        assert!(handler.is_async());
        let result = handler.invoke(args(&[("x", json!(41))])).await.unwrap();
        assert_eq!(result, json!(42));
    }

    #[test]
    fn test_parameters_schema() {
        let def = ToolDefinition::new(
            "read_file",
            "Read file contents",
            ToolCategory::Filesystem,
            ToolHandler::sync(|_| Ok(Value::Null)),
        )
        .with_parameter(ToolParameter::required(
            "path",
            ParameterType::String,
            "File path to read",
        ))
        .with_parameter(
            ToolParameter::optional("max_lines", ParameterType::Integer, "Max lines to read")
                .with_default(json!(100)),
        );

        let schema = def.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["path"]["type"], "string");
        assert_eq!(schema["properties"]["max_lines"]["default"], 100);

        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "path");
    }

    #[test]
    fn test_openai_schema() {
        let def = ToolDefinition::new(
            "calculate",
            "Evaluate an arithmetic expression",
            ToolCategory::Computation,
            ToolHandler::sync(|_| Ok(Value::Null)),
        )
        .with_parameter(ToolParameter::required(
            "expression",
            ParameterType::String,
            "Expression to evaluate",
        ));

        let schema = def.to_openai_schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "calculate");
        assert_eq!(
            schema["function"]["parameters"]["properties"]["expression"]["type"],
            "string"
        );
    }

    #[test]
    fn test_anthropic_schema() {
        let def = ToolDefinition::new(
            "http_request",
            "Fetch a URL",
            ToolCategory::Network,
            ToolHandler::sync(|_| Ok(Value::Null)),
        )
        .with_parameter(ToolParameter::required(
            "url",
            ParameterType::String,
            "URL to fetch",
        ))
        .with_parameter(
            ToolParameter::optional("method", ParameterType::String, "HTTP method")
                .with_allowed_values(vec!["GET".to_string(), "POST".to_string()]),
        );

        let schema = def.to_anthropic_schema();
        assert_eq!(schema["name"], "http_request");
        assert_eq!(schema["input_schema"]["type"], "object");
        let methods = schema["input_schema"]["properties"]["method"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(methods.len(), 2);
    }
}
