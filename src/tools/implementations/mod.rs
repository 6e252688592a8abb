//! Builtin tool implementations
//!
//! The default tool set registered by `ToolRuntime`: filesystem
//! (read_file, write_file, list_dir), network (http_request), and
//! computation (calculate). Each builtin is declared with its full
//! parameter schema so the registry can export function-calling schemas
//! without extra wiring.

pub mod filesystem;
pub mod http;
pub mod math;

use crate::errors::{Result, ToolError};
use crate::tools::security::PathJail;
use crate::tools::types::{
    Arguments, ParameterType, ToolCategory, ToolDefinition, ToolHandler, ToolParameter,
};
use serde_json::{json, Value};

/// The builtin tool definitions, jailed to `jail`'s root
pub fn builtin_tools(jail: &PathJail) -> Vec<ToolDefinition> {
    vec![
        read_file_tool(jail),
        write_file_tool(jail),
        list_dir_tool(jail),
        http_request_tool(),
        calculate_tool(),
    ]
}

fn read_file_tool(jail: &PathJail) -> ToolDefinition {
    let jail = jail.clone();
    ToolDefinition::new(
        "read_file",
        "Read contents of a file",
        ToolCategory::Filesystem,
        ToolHandler::async_fn(move |args| {
            let jail = jail.clone();
            async move {
                let path = required_str(&args, "path")?;
                filesystem::read_file(&path, &jail).await
            }
        }),
    )
    .with_parameter(ToolParameter::required(
        "path",
        ParameterType::String,
        "File path to read (relative to the working directory)",
    ))
}

fn write_file_tool(jail: &PathJail) -> ToolDefinition {
    let jail = jail.clone();
    ToolDefinition::new(
        "write_file",
        "Write content to a file",
        ToolCategory::Filesystem,
        ToolHandler::async_fn(move |args| {
            let jail = jail.clone();
            async move {
                let path = required_str(&args, "path")?;
                let content = required_str(&args, "content")?;
                let append = optional_bool(&args, "append", false);
                filesystem::write_file(&path, &content, append, &jail).await
            }
        }),
    )
    .with_parameter(ToolParameter::required(
        "path",
        ParameterType::String,
        "File path to write (relative to the working directory)",
    ))
    .with_parameter(ToolParameter::required(
        "content",
        ParameterType::String,
        "Content to write to the file",
    ))
    .with_parameter(
        ToolParameter::optional(
            "append",
            ParameterType::Boolean,
            "Append instead of overwriting",
        )
        .with_default(json!(false)),
    )
}

fn list_dir_tool(jail: &PathJail) -> ToolDefinition {
    let jail = jail.clone();
    ToolDefinition::new(
        "list_dir",
        "List contents of a directory",
        ToolCategory::Filesystem,
        ToolHandler::async_fn(move |args| {
            let jail = jail.clone();
            async move {
                let path = required_str(&args, "path")?;
                let recursive = optional_bool(&args, "recursive", false);
                filesystem::list_dir(&path, recursive, &jail).await
            }
        }),
    )
    .with_parameter(ToolParameter::required(
        "path",
        ParameterType::String,
        "Directory path to list (relative to the working directory)",
    ))
    .with_parameter(
        ToolParameter::optional("recursive", ParameterType::Boolean, "List recursively")
            .with_default(json!(false)),
    )
}

fn http_request_tool() -> ToolDefinition {
    ToolDefinition::new(
        "http_request",
        "Fetch content from a URL",
        ToolCategory::Network,
        ToolHandler::async_fn(|args| async move {
            let url = required_str(&args, "url")?;
            let method = optional_str(&args, "method", "GET");
            let timeout = args
                .get("timeout_seconds")
                .and_then(Value::as_u64)
                .unwrap_or(30);
            http::http_request(&url, &method, timeout).await
        }),
    )
    .with_parameter(ToolParameter::required(
        "url",
        ParameterType::String,
        "URL to fetch",
    ))
    .with_parameter(
        ToolParameter::optional("method", ParameterType::String, "HTTP method")
            .with_allowed_values(vec!["GET".to_string(), "POST".to_string(), "HEAD".to_string()])
            .with_default(json!("GET")),
    )
    .with_parameter(
        ToolParameter::optional("timeout_seconds", ParameterType::Integer, "Timeout in seconds")
            .with_default(json!(30)),
    )
}

fn calculate_tool() -> ToolDefinition {
    ToolDefinition::new(
        "calculate",
        "Evaluate an arithmetic expression",
        ToolCategory::Computation,
        ToolHandler::sync(|args| {
            let expression = required_str(&args, "expression")?;
            math::calculate(&expression)
        }),
    )
    .with_parameter(ToolParameter::required(
        "expression",
        ParameterType::String,
        "Arithmetic expression to evaluate, e.g. '2 + 2 * 3'",
    ))
}

fn required_str(args: &Arguments, name: &str) -> Result<String> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ToolError::ValidationError(format!(
                "invalid arguments: missing required '{}'",
                name
            ))
        })
}

fn optional_str(args: &Arguments, name: &str, default: &str) -> String {
    args.get(name)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn optional_bool(args: &Arguments, name: &str, default: bool) -> bool {
    args.get(name).and_then(Value::as_bool).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_set() {
        let temp = TempDir::new().unwrap();
        let jail = PathJail::new(temp.path()).unwrap();

        let tools = builtin_tools(&jail);
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(tools.len(), 5);
        assert!(names.contains(&"read_file"));
        assert!(names.contains(&"write_file"));
        assert!(names.contains(&"list_dir"));
        assert!(names.contains(&"http_request"));
        assert!(names.contains(&"calculate"));
    }

    #[test]
    fn test_builtin_schemas_are_complete() {
        let temp = TempDir::new().unwrap();
        let jail = PathJail::new(temp.path()).unwrap();

        for tool in builtin_tools(&jail) {
            assert!(!tool.description.is_empty());
            let schema = tool.parameters_schema();
            assert_eq!(schema["type"], "object");
        }
    }

    #[tokio::test]
    async fn test_calculate_handler_end_to_end() {
        let tool = calculate_tool();

        let mut args = Arguments::new();
        args.insert("expression".to_string(), json!("2+2"));
        let result = tool.handler.invoke(args).await.unwrap();
        assert_eq!(result.as_f64(), Some(4.0));
    }

    #[tokio::test]
    async fn test_missing_argument_is_validation_error() {
        let tool = calculate_tool();

        let err = tool.handler.invoke(Arguments::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::ValidationError(_)));
    }
}
