//! toolbuddy - Tool execution and error-recovery engine
//!
//! Lets an agent invoke external tools (file I/O, HTTP, math, anything
//! registered as a callable) and recover gracefully when those calls
//! fail. Untrusted arguments are sanitized before they reach a tool
//! body, every call runs under a timeout, failures are classified into
//! a typed taxonomy, transient ones retry with exponential backoff,
//! exhausted calls try fallback tools, and independent calls run
//! concurrently with isolated failures and aggregate statistics.
//!
//! # Architecture
//!
//! - `tools`: data model, registry, sanitizer, retry policy, executor
//! - `recovery`: error classification and fallback planning
//! - `telemetry`: single-writer execution statistics
//! - `config`: TOML configuration for all of the above

pub mod config;
pub mod errors;
pub mod recovery;
pub mod telemetry;
pub mod tools;

// Re-export commonly used types
pub use config::Config;
pub use errors::{Result, ToolError};
pub use recovery::{
    ClassifierRule, ErrorClassifier, ErrorPattern, ErrorType, FallbackSuggestion, RuleSet,
};
pub use telemetry::{ExecutionStats, TelemetryCollector};
pub use tools::{
    Arguments, ExecutionConfig, InputSanitizer, ParameterType, PathJail, RetryConfig, RetryPolicy,
    SanitizerConfig, ToolCall, ToolCategory, ToolDefinition, ToolExecutor, ToolHandler,
    ToolParameter, ToolRegistry, ToolRequest, ToolResult, ToolRuntime,
};
