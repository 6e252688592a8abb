//! Fallback planner
//!
//! Static adjacency table mapping a failed tool to alternates worth
//! trying, with arguments adapted from the failed call. The executor
//! filters suggestions against the live registry before attempting any.

use crate::recovery::types::FallbackSuggestion;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Plans fallback substitutions for exhausted tool calls
#[derive(Debug, Clone, Default)]
pub struct FallbackPlanner;

impl FallbackPlanner {
    /// Create a planner over the built-in adjacency table
    pub fn new() -> Self {
        Self
    }

    /// Ordered fallback suggestions for a failed tool
    ///
    /// Returns an empty list when the tool has no useful neighbors.
    pub fn suggestions(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
    ) -> Vec<FallbackSuggestion> {
        match tool_name {
            "web_search" => self.web_search_fallbacks(arguments),
            "read_file" => self.read_file_fallbacks(arguments),
            "http_request" => self.http_request_fallbacks(arguments),
            "list_dir" => self.list_dir_fallbacks(arguments),
            _ => Vec::new(),
        }
    }

    /// A failed search can often be served by fetching a search page
    /// through the generic HTTP tool.
    fn web_search_fallbacks(&self, arguments: &Map<String, Value>) -> Vec<FallbackSuggestion> {
        let Some(query) = arguments.get("query").and_then(Value::as_str) else {
            return Vec::new();
        };

        let mut args = Map::new();
        args.insert(
            "url".to_string(),
            json!(format!("https://duckduckgo.com/html/?q={}", encode_query(query))),
        );

        vec![FallbackSuggestion {
            tool_name: "http_request".to_string(),
            arguments: args,
            rationale: "Fetch the search results page directly over HTTP".to_string(),
            substitute: true,
        }]
    }

    /// A failed read usually means the path is wrong; listing the
    /// containing directory locates the file.
    fn read_file_fallbacks(&self, arguments: &Map<String, Value>) -> Vec<FallbackSuggestion> {
        let path = arguments
            .get("path")
            .or_else(|| arguments.get("file_path"))
            .and_then(Value::as_str);
        let Some(path) = path else {
            return Vec::new();
        };

        let parent = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        let mut args = Map::new();
        args.insert("path".to_string(), json!(parent));

        vec![FallbackSuggestion {
            tool_name: "list_dir".to_string(),
            arguments: args,
            rationale: "List the containing directory to locate the file".to_string(),
            substitute: false,
        }]
    }

    fn http_request_fallbacks(&self, arguments: &Map<String, Value>) -> Vec<FallbackSuggestion> {
        let Some(url) = arguments.get("url").and_then(Value::as_str) else {
            return Vec::new();
        };

        let mut args = Map::new();
        args.insert("query".to_string(), json!(url));

        vec![FallbackSuggestion {
            tool_name: "web_search".to_string(),
            arguments: args,
            rationale: "Search for the page instead of fetching it directly".to_string(),
            substitute: true,
        }]
    }

    /// A failed listing steps up one directory level.
    fn list_dir_fallbacks(&self, arguments: &Map<String, Value>) -> Vec<FallbackSuggestion> {
        let Some(path) = arguments.get("path").and_then(Value::as_str) else {
            return Vec::new();
        };

        let parent = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().to_string());
        let Some(parent) = parent else {
            return Vec::new();
        };

        let mut args = Map::new();
        args.insert("path".to_string(), json!(parent));

        vec![FallbackSuggestion {
            tool_name: "list_dir".to_string(),
            arguments: args,
            rationale: "List the parent directory instead".to_string(),
            substitute: false,
        }]
    }
}

/// Minimal percent-encoding for query strings
fn encode_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for byte in query.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
