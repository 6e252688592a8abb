//! Tool execution engine
//!
//! - `types`: data model (definitions, calls, batches, schemas)
//! - `registry`: name → definition lookup and schema export
//! - `security`: input sanitization and the path jail
//! - `retry`: retry decisions and backoff
//! - `executor`: the per-call protocol and batch orchestration
//! - `runtime`: the wired-together facade
//! - `implementations`: the builtin tool set

pub mod executor;
pub mod implementations;
pub mod registry;
pub mod retry;
pub mod runtime;
pub mod security;
pub mod types;

pub use executor::{ExecutionConfig, ToolExecutor, ToolRequest};
pub use registry::ToolRegistry;
pub use retry::{RetryConfig, RetryPolicy};
pub use runtime::ToolRuntime;
pub use security::{InputSanitizer, PathJail, SanitizerConfig};
pub use types::{
    Arguments, ParameterType, ToolCall, ToolCategory, ToolDefinition, ToolHandler, ToolParameter,
    ToolResult,
};
