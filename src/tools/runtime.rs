//! Tool runtime coordinator
//!
//! The crate's main entry point. Wires together the registry (builtins
//! plus caller-registered tools), sanitizer, executor, and telemetry
//! for one working directory.

use crate::config::Config;
use crate::errors::Result;
use crate::recovery::classifier::ErrorClassifier;
use crate::telemetry::ExecutionStats;
use crate::tools::executor::{ToolExecutor, ToolRequest};
use crate::tools::implementations::builtin_tools;
use crate::tools::registry::ToolRegistry;
use crate::tools::security::InputSanitizer;
use crate::tools::types::{Arguments, ToolCall, ToolDefinition, ToolResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Tool runtime coordinator
pub struct ToolRuntime {
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    parallel_default: bool,
}

impl ToolRuntime {
    /// Create a runtime with the builtin tool set, jailed to `working_dir`
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(working_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_tools(working_dir, Config::default(), Vec::new())
    }

    /// Create a runtime with explicit configuration
    pub fn with_config(working_dir: impl AsRef<Path>, config: Config) -> Result<Self> {
        Self::with_tools(working_dir, config, Vec::new())
    }

    /// Create a runtime with additional caller-registered tools
    ///
    /// Registration happens here, once, at startup; the registry is
    /// immutable afterward.
    pub fn with_tools(
        working_dir: impl AsRef<Path>,
        config: Config,
        extra_tools: Vec<ToolDefinition>,
    ) -> Result<Self> {
        config.validate()?;

        let sanitizer = InputSanitizer::with_config(working_dir.as_ref(), &config.sanitizer)?;

        let mut registry = ToolRegistry::new();
        for tool in builtin_tools(sanitizer.jail()) {
            registry.register(tool)?;
        }
        for tool in extra_tools {
            registry.register(tool)?;
        }
        let registry = Arc::new(registry);

        let parallel_default = config.execution.parallel;
        let mut executor = ToolExecutor::new(
            Arc::clone(&registry),
            Arc::new(sanitizer),
            config.execution,
            config.retry,
        )?;

        if let Some(rules) = config.classifier_rules {
            executor = executor.with_classifier(ErrorClassifier::with_rules(rules)?);
        }

        Ok(Self {
            registry,
            executor,
            parallel_default,
        })
    }

    /// Execute one tool call
    pub async fn execute(&self, tool: &str, arguments: Arguments) -> ToolCall {
        self.executor.execute_tool(tool, arguments, None).await
    }

    /// Execute one tool call with an explicit timeout
    pub async fn execute_with_timeout(
        &self,
        tool: &str,
        arguments: Arguments,
        timeout: Duration,
    ) -> ToolCall {
        self.executor.execute_tool(tool, arguments, Some(timeout)).await
    }

    /// Execute a batch of calls using the configured scheduling mode
    pub async fn execute_batch(&self, requests: Vec<ToolRequest>) -> ToolResult {
        self.executor
            .execute_tools(requests, self.parallel_default)
            .await
    }

    /// Execute a batch with an explicit scheduling mode
    pub async fn execute_batch_with_mode(
        &self,
        requests: Vec<ToolRequest>,
        parallel: bool,
    ) -> ToolResult {
        self.executor.execute_tools(requests, parallel).await
    }

    /// Tool registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// All registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Aggregate execution statistics
    pub async fn stats(&self) -> ExecutionStats {
        self.executor.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn args(pairs: &[(&str, serde_json::Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_runtime_registers_builtins() {
        let temp = TempDir::new().unwrap();
        let runtime = ToolRuntime::new(temp.path()).unwrap();

        assert_eq!(runtime.tool_names().len(), 5);
        assert!(runtime.has_tool("read_file"));
        assert!(runtime.has_tool("write_file"));
        assert!(runtime.has_tool("list_dir"));
        assert!(runtime.has_tool("http_request"));
        assert!(runtime.has_tool("calculate"));
        assert!(!runtime.has_tool("nonexistent"));
    }

    #[tokio::test]
    async fn test_execute_calculate() {
        let temp = TempDir::new().unwrap();
        let runtime = ToolRuntime::new(temp.path()).unwrap();

        let call = runtime
            .execute("calculate", args(&[("expression", json!("6 * 7"))]))
            .await;

        assert!(call.succeeded());
        assert_eq!(call.result.unwrap().as_f64(), Some(42.0));
    }

    #[tokio::test]
    async fn test_execute_write_then_read() {
        let temp = TempDir::new().unwrap();
        let runtime = ToolRuntime::new(temp.path()).unwrap();

        let write = runtime
            .execute(
                "write_file",
                args(&[("path", json!("note.txt")), ("content", json!("hello"))]),
            )
            .await;
        assert!(write.succeeded());

        let read = runtime
            .execute("read_file", args(&[("path", json!("note.txt"))]))
            .await;
        assert!(read.succeeded());
        assert_eq!(read.result.unwrap(), json!("hello"));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let temp = TempDir::new().unwrap();

        let mut config = Config::default();
        config.execution.timeout_seconds = 0;

        assert!(ToolRuntime::with_config(temp.path(), config).is_err());
    }

    #[tokio::test]
    async fn test_duplicate_extra_tool_rejected() {
        let temp = TempDir::new().unwrap();

        let duplicate = crate::tools::types::ToolDefinition::new(
            "calculate",
            "Shadowing builtin",
            crate::tools::types::ToolCategory::Computation,
            crate::tools::types::ToolHandler::sync(|_| Ok(serde_json::Value::Null)),
        );

        assert!(ToolRuntime::with_tools(temp.path(), Config::default(), vec![duplicate]).is_err());
    }
}
