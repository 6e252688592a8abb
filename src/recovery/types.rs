//! Recovery system type definitions
//!
//! The typed failure taxonomy, the classified pattern produced for a raw
//! error message, and the serializable rule table the classifier runs on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Operation exceeded its deadline (transient)
    Timeout,

    /// Access or credentials rejected (fatal)
    Permission,

    /// Upstream throttling (transient)
    RateLimit,

    /// Named thing does not exist (fatal)
    Resource,

    /// Connectivity failures (transient)
    Network,

    /// Bad or dangerous input (fatal, never retried)
    Validation,

    /// Anything unclassified (fatal after first attempt)
    Unknown,
}

impl ErrorType {
    /// Whether this category is transient by default
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorType::Timeout | ErrorType::Network | ErrorType::RateLimit
        )
    }

    /// Category name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Timeout => "timeout",
            ErrorType::Permission => "permission",
            ErrorType::RateLimit => "rate_limit",
            ErrorType::Resource => "resource",
            ErrorType::Network => "network",
            ErrorType::Validation => "validation",
            ErrorType::Unknown => "unknown",
        }
    }
}

/// One classification rule: a case-insensitive regex over the raw
/// failure message, plus the verdict it produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierRule {
    /// Regex matched against the raw message (compiled case-insensitive)
    pub pattern: String,

    /// Category assigned on match
    pub error_type: ErrorType,

    /// Human-readable description of the failure
    pub message: String,

    /// One concrete suggested action
    pub suggestion: String,

    /// Whether the failure may be retried
    pub can_retry: bool,

    /// Fallback tool names worth trying after retries are exhausted
    #[serde(default)]
    pub fallback_tools: Vec<String>,
}

/// Ordered, versioned classification rule table
///
/// Classification matches on the free-text wording of third-party error
/// messages, which drifts as upstreams change. The table is serializable
/// so deployments can override it without a rebuild, and the version tag
/// makes silent drift visible in logs and fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rule table version tag
    pub version: String,

    /// Rules in priority order; first match wins
    pub rules: Vec<ClassifierRule>,
}

/// Result of classifying a raw failure message
#[derive(Debug, Clone)]
pub struct ErrorPattern {
    /// Assigned category
    pub error_type: ErrorType,

    /// The raw message that was classified
    pub matched: String,

    /// Human-readable description of the failure
    pub message: String,

    /// One concrete suggested action
    pub suggestion: String,

    /// Whether the failure may be retried
    pub can_retry: bool,

    /// Fallback tool names worth trying
    pub fallback_tools: Vec<String>,
}

impl ErrorPattern {
    /// Classified message paired with the suggested action, the shape
    /// every surfaced error string takes
    pub fn summary(&self) -> String {
        format!("{}. {}", self.message, self.suggestion)
    }
}

/// A substitute tool to try once a primary tool's retries are exhausted
#[derive(Debug, Clone)]
pub struct FallbackSuggestion {
    /// Name of the fallback tool
    pub tool_name: String,

    /// Arguments adapted from the failed call
    pub arguments: Map<String, Value>,

    /// Why this substitution makes sense
    pub rationale: String,

    /// Whether the fallback can satisfy the original request
    ///
    /// Substitutes are executed in place of the failed tool; diagnostic
    /// suggestions (list the directory a missing file was expected in)
    /// cannot produce the requested result, so they are surfaced in the
    /// failure record instead of executed.
    pub substitute: bool,
}
