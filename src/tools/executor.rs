//! Tool executor
//!
//! Orchestrates single-call and batch execution: registry resolution,
//! argument sanitization, invocation under a timeout, failure
//! classification, retry with backoff, fallback substitution, and
//! aggregate statistics.
//!
//! The executor's public contract never errors for an individual tool
//! failure; every failure is a `ToolCall` with `error` set, a concrete
//! suggestion, and fallback tool names when available. Callers inspect
//! `succeeded()` rather than matching on `Err`.

use crate::errors::{Result, ToolError};
use crate::recovery::classifier::ErrorClassifier;
use crate::recovery::types::{ErrorPattern, FallbackSuggestion};
use crate::telemetry::{CallPhase, ExecutionStats, TelemetryCollector, ToolEvent};
use crate::tools::registry::ToolRegistry;
use crate::tools::retry::{RetryConfig, RetryPolicy};
use crate::tools::security::InputSanitizer;
use crate::tools::types::{Arguments, ToolCall, ToolDefinition, ToolResult};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum retries after the first attempt of a call
    pub max_retries: u32,

    /// Per-call timeout in seconds
    pub timeout_seconds: u64,

    /// Attempt fallback tools once retries are exhausted
    pub enable_fallbacks: bool,

    /// Default scheduling mode for batches
    pub parallel: bool,

    /// Concurrency bound for parallel batches
    #[serde(default = "default_max_parallel_ops")]
    pub max_parallel_ops: usize,
}

fn default_max_parallel_ops() -> usize {
    num_cpus::get().clamp(1, 8)
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout_seconds: 30,
            enable_fallbacks: true,
            parallel: true,
            max_parallel_ops: default_max_parallel_ops(),
        }
    }
}

impl ExecutionConfig {
    /// Reject malformed configurations
    ///
    /// This is the one place the engine errors to the caller: a zero
    /// timeout or zero-width semaphore is a programmer error, not a
    /// tool failure.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(ToolError::ConfigError(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.max_parallel_ops == 0 {
            return Err(ToolError::ConfigError(
                "max_parallel_ops must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// One requested invocation in a batch
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub name: String,
    pub arguments: Arguments,
}

impl ToolRequest {
    /// Create a request
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

struct AttemptOutcome {
    attempts: u32,
    result: std::result::Result<Value, (String, ErrorPattern)>,
}

/// Tool executor
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    sanitizer: Arc<InputSanitizer>,
    classifier: Arc<ErrorClassifier>,
    policy: RetryPolicy,
    config: ExecutionConfig,
    semaphore: Arc<Semaphore>,
    telemetry: TelemetryCollector,
}

impl ToolExecutor {
    /// Create an executor
    ///
    /// Must be called inside a Tokio runtime (the telemetry consumer
    /// task is spawned here).
    pub fn new(
        registry: Arc<ToolRegistry>,
        sanitizer: Arc<InputSanitizer>,
        config: ExecutionConfig,
        retry: RetryConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(config.max_parallel_ops)),
            policy: RetryPolicy::new(retry),
            classifier: Arc::new(ErrorClassifier::new()),
            telemetry: TelemetryCollector::new(),
            registry,
            sanitizer,
            config,
        })
    }

    /// Swap in a caller-supplied classifier (custom rule table)
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Executor configuration
    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Aggregate statistics snapshot
    pub async fn stats(&self) -> ExecutionStats {
        self.telemetry.snapshot().await
    }

    /// Execute one logical tool call through the full protocol
    ///
    /// # Flow
    /// 1. Resolve the name in the registry; unknown names fail
    ///    immediately with a "did you mean" hint, no retry
    /// 2. Sanitize every argument by its name-convention rule; a
    ///    sanitization failure is fatal for the call, no retry
    /// 3. Invoke the callable (sync or async) under the timeout
    /// 4. On failure: classify, retry transient errors with backoff,
    ///    then attempt substitute fallbacks, each with its own full
    ///    sanitize/invoke/retry cycle
    /// 5. The returned record reflects the last attempt
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: Arguments,
        timeout: Option<Duration>,
    ) -> ToolCall {
        let started = Instant::now();
        let mut call = ToolCall::new(name, arguments);
        self.phase(&call.id, CallPhase::Pending);

        let Some(definition) = self.registry.get(name) else {
            // Hard validation error, never transient
            call.attempts = 1;
            let suggestion = match self.registry.closest_match(name) {
                Some(candidate) => format!("Did you mean '{}'?", candidate),
                None => "Check the registered tool names".to_string(),
            };
            call.mark_failure(format!("Unknown tool: '{}'", name), suggestion, started.elapsed());
            self.phase(&call.id, CallPhase::Failed);
            self.complete(&call);
            return call;
        };

        self.phase(&call.id, CallPhase::Sanitizing);
        let sanitized = match self.sanitizer.sanitize_arguments(&call.arguments) {
            Ok(sanitized) => sanitized,
            Err(error) => {
                // The input itself is invalid, not the environment
                call.attempts = 1;
                let pattern = self.classifier.classify(&error.to_string());
                call.mark_failure(error.to_string(), pattern.suggestion, started.elapsed());
                self.phase(&call.id, CallPhase::Failed);
                self.complete(&call);
                return call;
            }
        };

        let timeout = timeout.unwrap_or(Duration::from_secs(self.config.timeout_seconds));

        let outcome = self
            .attempt_cycle(&call.id, &definition, &sanitized, timeout)
            .await;
        call.attempts = outcome.attempts;

        match outcome.result {
            Ok(value) => {
                call.mark_success(value, started.elapsed());
                self.phase(&call.id, CallPhase::Succeeded);
            }
            Err((raw_error, pattern)) => {
                self.phase(&call.id, CallPhase::Exhausted);

                let mut diagnostics = Vec::new();
                let mut recovered = false;

                if self.config.enable_fallbacks {
                    recovered = self
                        .try_fallbacks(&mut call, &sanitized, timeout, started, &mut diagnostics)
                        .await;
                }

                if !recovered {
                    let suggestion = compose_suggestion(&pattern, &diagnostics);
                    call.mark_failure(raw_error, suggestion, started.elapsed());
                    self.phase(&call.id, CallPhase::Failed);
                }
            }
        }

        self.complete(&call);
        call
    }

    /// Execute a batch of calls
    ///
    /// Parallel batches schedule each call as a concurrent task on the
    /// runtime, bounded by the executor semaphore; sequential batches
    /// run strictly in order. Either way the returned calls keep the
    /// caller-supplied order and one call's failure never cancels its
    /// siblings.
    pub async fn execute_tools(&self, requests: Vec<ToolRequest>, parallel: bool) -> ToolResult {
        let started = Instant::now();

        let calls = if parallel {
            let futures = requests.into_iter().map(|request| async move {
                let _permit = self.semaphore.acquire().await.unwrap();
                self.execute_tool(&request.name, request.arguments, None).await
            });
            join_all(futures).await
        } else {
            let mut calls = Vec::with_capacity(requests.len());
            for request in requests {
                calls.push(self.execute_tool(&request.name, request.arguments, None).await);
            }
            calls
        };

        ToolResult::new(calls, started.elapsed())
    }

    /// Invoke-classify-retry loop for one tool
    ///
    /// Sequential by construction: no retry for a logical call ever
    /// runs concurrently with another attempt for the same call.
    async fn attempt_cycle(
        &self,
        call_id: &str,
        definition: &ToolDefinition,
        arguments: &Arguments,
        timeout: Duration,
    ) -> AttemptOutcome {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.phase(call_id, CallPhase::Invoking);

            let raw_error = match self.invoke_once(definition, arguments.clone(), timeout).await {
                Ok(value) => {
                    return AttemptOutcome {
                        attempts: attempt,
                        result: Ok(value),
                    }
                }
                Err(error) => error.to_string(),
            };

            let pattern = self.classifier.classify(&raw_error);

            if self.policy.should_retry(&pattern, attempt) && attempt <= self.config.max_retries {
                self.telemetry.record(ToolEvent::RetryAttempted {
                    tool: definition.name.clone(),
                    attempt,
                });
                self.phase(call_id, CallPhase::RetryWait);
                tokio::time::sleep(self.policy.calculate_delay(attempt - 1, &pattern)).await;
                continue;
            }

            return AttemptOutcome {
                attempts: attempt,
                result: Err((raw_error, pattern)),
            };
        }
    }

    /// One invocation raced against the timeout
    ///
    /// A timeout cancels only this call's in-flight future; sibling
    /// calls in a batch are unaffected.
    async fn invoke_once(
        &self,
        definition: &ToolDefinition,
        arguments: Arguments,
        timeout: Duration,
    ) -> Result<Value> {
        match tokio::time::timeout(timeout, definition.handler.invoke(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                duration_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Attempt substitute fallbacks in order until one succeeds
    ///
    /// Each substitute runs its own full sanitize/invoke/retry cycle
    /// but no further fallbacks. Diagnostic suggestions are collected
    /// into `diagnostics` for the failure record instead of executed.
    async fn try_fallbacks(
        &self,
        call: &mut ToolCall,
        arguments: &Arguments,
        timeout: Duration,
        started: Instant,
        diagnostics: &mut Vec<FallbackSuggestion>,
    ) -> bool {
        let suggestions = self
            .classifier
            .get_fallback_suggestions(&call.name, arguments);

        for suggestion in suggestions {
            if suggestion.tool_name == call.name {
                continue;
            }

            if !suggestion.substitute {
                diagnostics.push(suggestion);
                continue;
            }

            let Some(definition) = self.registry.get(&suggestion.tool_name) else {
                continue;
            };
            let Ok(sanitized) = self.sanitizer.sanitize_arguments(&suggestion.arguments) else {
                continue;
            };

            self.telemetry.record(ToolEvent::FallbackAttempted {
                tool: call.name.clone(),
                fallback: suggestion.tool_name.clone(),
            });
            self.phase(&call.id, CallPhase::FallbackAttempt);

            let outcome = self
                .attempt_cycle(&call.id, &definition, &sanitized, timeout)
                .await;
            call.attempts += outcome.attempts;

            if let Ok(value) = outcome.result {
                call.fallback_tool = Some(suggestion.tool_name.clone());
                call.mark_success(value, started.elapsed());
                self.phase(&call.id, CallPhase::Succeeded);
                return true;
            }
        }

        false
    }

    fn phase(&self, call_id: &str, phase: CallPhase) {
        self.telemetry.record(ToolEvent::PhaseChanged {
            call_id: call_id.to_string(),
            phase,
        });
    }

    /// Exactly one completion event per logical call
    fn complete(&self, call: &ToolCall) {
        self.telemetry.record(ToolEvent::CallCompleted {
            tool: call.name.clone(),
            success: call.succeeded(),
            duration_ms: call.duration_ms,
        });
    }
}

/// Pair the classified suggestion with any diagnostic fallbacks
fn compose_suggestion(pattern: &ErrorPattern, diagnostics: &[FallbackSuggestion]) -> String {
    let mut names: Vec<&str> = diagnostics.iter().map(|s| s.tool_name.as_str()).collect();
    for tool in &pattern.fallback_tools {
        if !names.contains(&tool.as_str()) {
            names.push(tool.as_str());
        }
    }

    if names.is_empty() {
        pattern.suggestion.clone()
    } else {
        format!(
            "{} (fallback tools: {})",
            pattern.suggestion,
            names.join(", ")
        )
    }
}
