//! Input sanitization layer
//!
//! Validates and cleans untrusted arguments before they reach a tool
//! body: string deny-list screening, path jail verification, URL scheme
//! checks, and recursive JSON cleaning. Pure validation/transformation,
//! no side effects. A sanitization failure is a `ValidationError` and is
//! never retried by the executor: the input is invalid, not the
//! environment.

use crate::errors::{Result, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Default maximum accepted string length
pub const DEFAULT_MAX_STRING_LENGTH: usize = 10_000;

/// Shell-destructive commands and privilege escalation, rejected in any
/// string argument
const DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf",
    "rm -fr",
    "mkfs",
    "dd if=",
    ":(){",
    "> /dev/",
    "shutdown",
    "sudo ",
    "su -",
    "chmod 777",
    "chown -r",
    "../",
    "..\\",
];

/// Code-execution primitives, rejected unless the argument is a
/// declared code/expression field
const CODE_PATTERNS: &[&str] = &[
    "eval(",
    "exec(",
    "__import__",
    "os.system",
    "subprocess",
    "child_process",
];

/// Sanitizer tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Maximum accepted string length
    pub max_string_length: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
        }
    }
}

/// Path jail: confines every path argument to one root directory
///
/// Canonicalization resolves symlinks, `..`, and `.` before the prefix
/// check, so a path that verifies is guaranteed inside the root. Paths
/// that do not exist yet (write targets) verify through their parent.
#[derive(Debug, Clone)]
pub struct PathJail {
    root: PathBuf,
}

impl PathJail {
    /// Create a jail rooted at an existing directory
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();

        if !root.exists() {
            return Err(ToolError::ConfigError(format!(
                "Jail root does not exist: {}",
                root.display()
            )));
        }

        let root = root.canonicalize().map_err(|e| {
            ToolError::ConfigError(format!("Failed to canonicalize jail root: {}", e))
        })?;

        Ok(Self { root })
    }

    /// Verify a path is inside the jail and return its canonical form
    pub fn verify(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let full_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = match full_path.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                // Write targets may not exist yet; verify the parent
                // and reattach the file name.
                let parent = full_path.parent().filter(|p| p.exists());
                if let (Some(parent), Some(file_name)) = (parent, full_path.file_name()) {
                    let parent = parent.canonicalize().map_err(|_| {
                        ToolError::ValidationError(format!(
                            "Cannot verify path: {}",
                            path.display()
                        ))
                    })?;
                    if !parent.starts_with(&self.root) {
                        return Err(ToolError::ValidationError(format!(
                            "Path escapes permitted root: {}",
                            path.display()
                        )));
                    }
                    return Ok(parent.join(file_name));
                }

                return Err(ToolError::ValidationError(format!(
                    "Path verification failed: {}",
                    path.display()
                )));
            }
        };

        if !canonical.starts_with(&self.root) {
            return Err(ToolError::ValidationError(format!(
                "Path escapes permitted root: {}",
                path.display()
            )));
        }

        Ok(canonical)
    }

    /// Jail root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Validates and cleans untrusted tool arguments
#[derive(Debug, Clone)]
pub struct InputSanitizer {
    jail: PathJail,
    max_string_length: usize,
}

impl InputSanitizer {
    /// Create a sanitizer with the given permitted root
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            jail: PathJail::new(root)?,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
        })
    }

    /// Create a sanitizer with explicit tuning
    pub fn with_config(root: impl AsRef<Path>, config: &SanitizerConfig) -> Result<Self> {
        Ok(Self {
            jail: PathJail::new(root)?,
            max_string_length: config.max_string_length,
        })
    }

    /// Path jail in use
    pub fn jail(&self) -> &PathJail {
        &self.jail
    }

    /// Validate and clean a string argument
    ///
    /// Rejects oversized values and deny-listed patterns; strips
    /// control characters. Code-execution primitives pass only when
    /// `allow_code` is set (declared code/expression fields).
    pub fn sanitize_string(&self, value: &str, allow_code: bool) -> Result<String> {
        if value.len() > self.max_string_length {
            return Err(ToolError::ValidationError(format!(
                "Input exceeds maximum length of {} characters",
                self.max_string_length
            )));
        }

        let lowered = value.to_lowercase();

        for pattern in DANGEROUS_PATTERNS {
            if lowered.contains(pattern) {
                return Err(ToolError::ValidationError(format!(
                    "Dangerous pattern detected: '{}'",
                    pattern
                )));
            }
        }

        if !allow_code {
            for pattern in CODE_PATTERNS {
                if lowered.contains(pattern) {
                    return Err(ToolError::ValidationError(format!(
                        "Code execution primitive not allowed here: '{}'",
                        pattern
                    )));
                }
            }
        }

        let cleaned: String = value
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect();

        Ok(cleaned)
    }

    /// Validate a path argument against the jail
    pub fn sanitize_path(&self, value: &str) -> Result<PathBuf> {
        if value.contains('\0') {
            return Err(ToolError::ValidationError(
                "Path contains a NUL byte".to_string(),
            ));
        }
        self.jail.verify(value)
    }

    /// Validate a URL argument: http/https schemes only
    pub fn sanitize_url(&self, value: &str) -> Result<String> {
        let url = reqwest::Url::parse(value)
            .map_err(|e| ToolError::ValidationError(format!("Invalid URL '{}': {}", value, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url.to_string()),
            scheme => Err(ToolError::ValidationError(format!(
                "URL scheme '{}' is not allowed (http/https only)",
                scheme
            ))),
        }
    }

    /// Parse a JSON argument and clean markup in its string leaves
    ///
    /// Script tags and javascript: URLs are neutralized rather than the
    /// whole value rejected, so benign HTML-like text round-trips.
    pub fn sanitize_json(&self, value: &str) -> Result<Value> {
        let parsed: Value = serde_json::from_str(value)
            .map_err(|e| ToolError::ValidationError(format!("Invalid JSON: {}", e)))?;
        Ok(clean_value(parsed))
    }

    /// Sanitize a full argument map by argument-name convention
    ///
    /// `path`/`file_path`/`dir` use the path rule, `url`/`uri` the URL
    /// rule, `code`/`expression`/`script` the string rule with code
    /// allowed, and every other string the plain string rule. Arrays
    /// and objects are cleaned recursively; numbers and booleans pass
    /// through.
    pub fn sanitize_arguments(&self, arguments: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut sanitized = Map::with_capacity(arguments.len());

        for (name, value) in arguments {
            sanitized.insert(name.clone(), self.sanitize_argument(name, value)?);
        }

        Ok(sanitized)
    }

    fn sanitize_argument(&self, name: &str, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => match name {
                "path" | "file_path" | "dir" | "directory" => {
                    let path = self.sanitize_path(s)?;
                    Ok(Value::String(path.to_string_lossy().to_string()))
                }
                "url" | "uri" => Ok(Value::String(self.sanitize_url(s)?)),
                "code" | "expression" | "script" => {
                    Ok(Value::String(self.sanitize_string(s, true)?))
                }
                _ => Ok(Value::String(self.sanitize_string(s, false)?)),
            },
            Value::Array(_) | Value::Object(_) => Ok(clean_value(value.clone())),
            other => Ok(other.clone()),
        }
    }
}

/// Recursively neutralize markup in string leaves
fn clean_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_markup(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, clean_value(v)))
                .collect(),
        ),
        other => other,
    }
}

fn clean_markup(text: &str) -> String {
    // Compiled per call; argument maps are small and this path is not hot
    let script = regex::RegexBuilder::new(r"</?script[^>]*>")
        .case_insensitive(true)
        .build()
        .expect("static pattern");
    let js_url = regex::RegexBuilder::new(r"javascript:")
        .case_insensitive(true)
        .build()
        .expect("static pattern");

    let cleaned = script.replace_all(text, "");
    js_url.replace_all(&cleaned, "").to_string()
}
