//! Tool registry
//!
//! Name → definition lookup, list-by-category, and schema export for
//! the calling agent. Tools are registered explicitly at startup and
//! the registry is immutable afterward; there are no import-time side
//! effects.

use crate::errors::{Result, ToolError};
use crate::tools::types::{ToolCategory, ToolDefinition};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool registry
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool definition
    ///
    /// Duplicate names are a configuration error: the registry is built
    /// once at startup and never mutated after.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<()> {
        if self.tools.contains_key(&definition.name) {
            return Err(ToolError::ConfigError(format!(
                "Tool '{}' is already registered",
                definition.name
            )));
        }
        self.tools
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(())
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tools in a category
    pub fn list(&self, category: ToolCategory) -> Vec<Arc<ToolDefinition>> {
        let mut tools: Vec<_> = self
            .tools
            .values()
            .filter(|def| def.category == category)
            .cloned()
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// All tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered name closest to `name`, for "did you mean" hints
    ///
    /// Returns None when nothing is plausibly close (distance greater
    /// than a third of the query length, minimum 2).
    pub fn closest_match(&self, name: &str) -> Option<String> {
        let threshold = (name.len() / 3).max(2);

        let mut candidates: Vec<(usize, &String)> = self
            .tools
            .keys()
            .map(|candidate| (edit_distance(name, candidate), candidate))
            .filter(|(distance, _)| *distance <= threshold)
            .collect();

        // Sort by distance, then name, so ties resolve deterministically
        candidates.sort();
        candidates.first().map(|(_, candidate)| (*candidate).clone())
    }

    /// OpenAI-style function-calling schemas for every tool, sorted by name
    pub fn openai_schemas(&self) -> Vec<Value> {
        self.sorted_definitions()
            .into_iter()
            .map(|def| def.to_openai_schema())
            .collect()
    }

    /// Anthropic-style function-calling schemas for every tool, sorted by name
    pub fn anthropic_schemas(&self) -> Vec<Value> {
        self.sorted_definitions()
            .into_iter()
            .map(|def| def.to_anthropic_schema())
            .collect()
    }

    fn sorted_definitions(&self) -> Vec<Arc<ToolDefinition>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Total number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Levenshtein edit distance between two names
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{ParameterType, ToolHandler, ToolParameter};
    use serde_json::json;

    fn noop_tool(name: &str, category: ToolCategory) -> ToolDefinition {
        ToolDefinition::new(
            name,
            format!("{} tool", name),
            category,
            ToolHandler::sync(|_| Ok(Value::Null)),
        )
    }

    fn sample_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(noop_tool("read_file", ToolCategory::Filesystem))
            .unwrap();
        registry
            .register(noop_tool("write_file", ToolCategory::Filesystem))
            .unwrap();
        registry
            .register(noop_tool("list_dir", ToolCategory::Filesystem))
            .unwrap();
        registry
            .register(noop_tool("http_request", ToolCategory::Network))
            .unwrap();
        registry
            .register(noop_tool("calculate", ToolCategory::Computation))
            .unwrap();
        registry
    }

    #[test]
    fn test_register_and_get() {
        let registry = sample_registry();

        assert_eq!(registry.len(), 5);
        assert!(registry.contains("read_file"));
        assert!(registry.get("read_file").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = sample_registry();
        let result = registry.register(noop_tool("read_file", ToolCategory::Filesystem));
        assert!(result.is_err());
    }

    #[test]
    fn test_list_by_category() {
        let registry = sample_registry();

        let fs_tools = registry.list(ToolCategory::Filesystem);
        assert_eq!(fs_tools.len(), 3);
        assert_eq!(fs_tools[0].name, "list_dir");

        let network = registry.list(ToolCategory::Network);
        assert_eq!(network.len(), 1);

        assert!(registry.list(ToolCategory::Process).is_empty());
    }

    #[test]
    fn test_tool_names_sorted() {
        let registry = sample_registry();
        let names = registry.tool_names();
        assert_eq!(
            names,
            vec!["calculate", "http_request", "list_dir", "read_file", "write_file"]
        );
    }

    #[test]
    fn test_closest_match() {
        let registry = sample_registry();

        assert_eq!(registry.closest_match("read_fil"), Some("read_file".to_string()));
        assert_eq!(registry.closest_match("lst_dir"), Some("list_dir".to_string()));
        assert_eq!(registry.closest_match("calcualte"), Some("calculate".to_string()));

        // Nothing plausibly close
        assert_eq!(registry.closest_match("zz"), None);
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", "abc"), 0);
        assert_eq!(edit_distance("abc", "abd"), 1);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_schema_export() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                noop_tool("calculate", ToolCategory::Computation).with_parameter(
                    ToolParameter::required(
                        "expression",
                        ParameterType::String,
                        "Expression to evaluate",
                    ),
                ),
            )
            .unwrap();
        registry
            .register(noop_tool("read_file", ToolCategory::Filesystem))
            .unwrap();

        let openai = registry.openai_schemas();
        assert_eq!(openai.len(), 2);
        assert_eq!(openai[0]["function"]["name"], "calculate");
        assert_eq!(openai[0]["type"], "function");

        let anthropic = registry.anthropic_schemas();
        assert_eq!(anthropic[0]["name"], "calculate");
        assert_eq!(
            anthropic[0]["input_schema"]["required"],
            json!(["expression"])
        );
    }
}
