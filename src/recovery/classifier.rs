//! Error classifier
//!
//! Maps raw failure messages to the typed taxonomy by scanning an
//! ordered rule table of case-insensitive regexes; first match wins.
//! Unmatched messages classify as UNKNOWN and are not retried.

use crate::errors::{Result, ToolError};
use crate::recovery::fallback::FallbackPlanner;
use crate::recovery::types::{
    ClassifierRule, ErrorPattern, ErrorType, FallbackSuggestion, RuleSet,
};
use regex::RegexBuilder;
use serde_json::{Map, Value};

/// Error classifier with a compiled rule table
pub struct ErrorClassifier {
    /// Rule table version, carried through for drift tracking
    version: String,

    /// Compiled rules in priority order
    rules: Vec<(regex::Regex, ClassifierRule)>,

    /// Fallback adjacency planner
    planner: FallbackPlanner,
}

impl ErrorClassifier {
    /// Create a classifier from the built-in rule table
    pub fn new() -> Self {
        // Built-in rules always compile; unwrap is safe here
        Self::with_rules(default_rules()).expect("built-in rule table must compile")
    }

    /// Create a classifier from a caller-supplied rule table
    pub fn with_rules(rule_set: RuleSet) -> Result<Self> {
        let mut rules = Vec::with_capacity(rule_set.rules.len());

        for rule in rule_set.rules {
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    ToolError::ConfigError(format!(
                        "Invalid classifier pattern '{}': {}",
                        rule.pattern, e
                    ))
                })?;
            rules.push((regex, rule));
        }

        Ok(Self {
            version: rule_set.version,
            rules,
            planner: FallbackPlanner::new(),
        })
    }

    /// Rule table version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Classify a raw failure message
    ///
    /// Scans the rule table in order; the first matching rule decides
    /// the category, retryability, and suggested action.
    pub fn classify(&self, message: &str) -> ErrorPattern {
        for (regex, rule) in &self.rules {
            if regex.is_match(message) {
                return ErrorPattern {
                    error_type: rule.error_type,
                    matched: message.to_string(),
                    message: rule.message.clone(),
                    suggestion: rule.suggestion.clone(),
                    can_retry: rule.can_retry,
                    fallback_tools: rule.fallback_tools.clone(),
                };
            }
        }

        ErrorPattern {
            error_type: ErrorType::Unknown,
            matched: message.to_string(),
            message: "Unrecognized failure".to_string(),
            suggestion: "Inspect the raw error and adjust the arguments or tool choice"
                .to_string(),
            can_retry: false,
            fallback_tools: Vec::new(),
        }
    }

    /// Ordered fallback suggestions for a failed tool call
    ///
    /// Drawn from the static adjacency table, with arguments adapted
    /// from the failed call.
    pub fn get_fallback_suggestions(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
    ) -> Vec<FallbackSuggestion> {
        self.planner.suggestions(tool_name, arguments)
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in classification rule table
///
/// Ordering matters: specific wordings (rate limits, not-found) sit
/// above the broad catch-alls for their transport.
pub fn default_rules() -> RuleSet {
    let rule = |pattern: &str,
                error_type: ErrorType,
                message: &str,
                suggestion: &str,
                can_retry: bool,
                fallback_tools: &[&str]| ClassifierRule {
        pattern: pattern.to_string(),
        error_type,
        message: message.to_string(),
        suggestion: suggestion.to_string(),
        can_retry,
        fallback_tools: fallback_tools.iter().map(|s| s.to_string()).collect(),
    };

    RuleSet {
        version: "builtin-1".to_string(),
        rules: vec![
            rule(
                r"timed out|timeout|deadline exceeded",
                ErrorType::Timeout,
                "The operation exceeded its time limit",
                "Retry with a longer timeout or a smaller request",
                true,
                &[],
            ),
            rule(
                r"rate limit|too many requests|\b429\b",
                ErrorType::RateLimit,
                "The upstream service is throttling requests",
                "Wait before retrying and reduce request frequency",
                true,
                &[],
            ),
            rule(
                r"connection refused|connection reset|network|unreachable|dns|broken pipe|connection closed",
                ErrorType::Network,
                "A network-level failure interrupted the call",
                "Check connectivity and retry",
                true,
                &[],
            ),
            rule(
                r"permission denied|access denied|forbidden|unauthorized|\b401\b|\b403\b",
                ErrorType::Permission,
                "Access to the target was denied",
                "Check credentials or choose a target you are allowed to access",
                false,
                &[],
            ),
            rule(
                r"not found|no such file|does not exist|\b404\b",
                ErrorType::Resource,
                "The requested resource does not exist",
                "Verify the name or path; listing the containing directory can help",
                false,
                &["list_dir"],
            ),
            rule(
                r"division by zero|divide by zero",
                ErrorType::Validation,
                "The expression divides by zero",
                "Fix the expression operands and call again",
                false,
                &[],
            ),
            rule(
                r"invalid|malformed|bad request|parse error|validation",
                ErrorType::Validation,
                "The input was rejected as invalid",
                "Fix the arguments; invalid input is never retried",
                false,
                &[],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // One fixture per known upstream wording, so a silent
    // misclassification shows up as a test failure rather than a
    // changed retry decision in production.
    #[test]
    fn test_known_upstream_messages() {
        let classifier = ErrorClassifier::new();

        let fixtures: Vec<(&str, ErrorType, bool)> = vec![
            ("Operation timed out after 30000ms", ErrorType::Timeout, true),
            ("deadline exceeded while awaiting response", ErrorType::Timeout, true),
            ("429 Too Many Requests", ErrorType::RateLimit, true),
            ("rate limit exceeded, retry after 60s", ErrorType::RateLimit, true),
            ("connection refused (os error 111)", ErrorType::Network, true),
            ("dns error: failed to lookup address", ErrorType::Network, true),
            ("Connection reset by peer", ErrorType::Network, true),
            ("Permission denied (os error 13)", ErrorType::Permission, false),
            ("HTTP 403 Forbidden", ErrorType::Permission, false),
            ("401 Unauthorized", ErrorType::Permission, false),
            ("No such file or directory", ErrorType::Resource, false),
            ("File not found: notes.txt", ErrorType::Resource, false),
            ("HTTP 404 Not Found", ErrorType::Resource, false),
            ("division by zero in '1/0'", ErrorType::Validation, false),
            ("invalid expression: unexpected token", ErrorType::Validation, false),
            ("malformed JSON payload", ErrorType::Validation, false),
        ];

        for (message, expected_type, expected_retry) in fixtures {
            let pattern = classifier.classify(message);
            assert_eq!(pattern.error_type, expected_type, "message: {}", message);
            assert_eq!(pattern.can_retry, expected_retry, "message: {}", message);
        }
    }

    #[test]
    fn test_unmatched_is_unknown_not_retryable() {
        let classifier = ErrorClassifier::new();
        let pattern = classifier.classify("segmentation fault (core dumped)");

        assert_eq!(pattern.error_type, ErrorType::Unknown);
        assert!(!pattern.can_retry);
        assert!(!pattern.suggestion.is_empty());
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let classifier = ErrorClassifier::new();

        assert_eq!(
            classifier.classify("CONNECTION REFUSED").error_type,
            ErrorType::Network
        );
        assert_eq!(
            classifier.classify("Not Found").error_type,
            ErrorType::Resource
        );
    }

    #[test]
    fn test_first_match_wins() {
        // "timed out" sits above the network rule, so a message with
        // both wordings classifies as a timeout.
        let classifier = ErrorClassifier::new();
        let pattern = classifier.classify("network request timed out");
        assert_eq!(pattern.error_type, ErrorType::Timeout);
    }

    #[test]
    fn test_not_found_carries_fallback() {
        let classifier = ErrorClassifier::new();
        let pattern = classifier.classify("File not found: a.txt");
        assert!(pattern.fallback_tools.contains(&"list_dir".to_string()));
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = RuleSet {
            version: "custom-1".to_string(),
            rules: vec![ClassifierRule {
                pattern: "quota exhausted".to_string(),
                error_type: ErrorType::RateLimit,
                message: "Daily quota used up".to_string(),
                suggestion: "Wait until the quota resets".to_string(),
                can_retry: true,
                fallback_tools: vec![],
            }],
        };

        let classifier = ErrorClassifier::with_rules(rules).unwrap();
        assert_eq!(classifier.version(), "custom-1");

        let pattern = classifier.classify("request failed: quota exhausted");
        assert_eq!(pattern.error_type, ErrorType::RateLimit);

        // Messages the builtin table would match are unknown here
        let pattern = classifier.classify("connection refused");
        assert_eq!(pattern.error_type, ErrorType::Unknown);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let rules = RuleSet {
            version: "bad".to_string(),
            rules: vec![ClassifierRule {
                pattern: "([unclosed".to_string(),
                error_type: ErrorType::Unknown,
                message: String::new(),
                suggestion: String::new(),
                can_retry: false,
                fallback_tools: vec![],
            }],
        };

        assert!(ErrorClassifier::with_rules(rules).is_err());
    }

    #[test]
    fn test_fallback_suggestions_delegate() {
        let classifier = ErrorClassifier::new();
        let mut args = Map::new();
        args.insert("query".to_string(), json!("rust retry backoff"));

        let suggestions = classifier.get_fallback_suggestions("web_search", &args);
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].tool_name, "http_request");
    }
}
