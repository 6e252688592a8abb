//! Filesystem tool implementations
//!
//! Secure filesystem operations, all confined to the path jail:
//! - read_file: read file contents with a size limit
//! - write_file: write content, creating parent directories inside the jail
//! - list_dir: list directory contents, optionally recursive

use crate::errors::{Result, ToolError};
use crate::tools::security::PathJail;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Maximum file size read_file will return (2MB)
pub const MAX_READ_BYTES: u64 = 2_097_152;

/// Read file contents
pub async fn read_file(path: &str, jail: &PathJail) -> Result<Value> {
    let verified = jail.verify(path)?;

    if !verified.exists() {
        return Err(ToolError::Generic(format!("File not found: {}", path)));
    }
    if !verified.is_file() {
        return Err(ToolError::ValidationError(format!(
            "Path is not a regular file: {}",
            path
        )));
    }

    let size = fs::metadata(&verified)?.len();
    if size > MAX_READ_BYTES {
        return Err(ToolError::ValidationError(format!(
            "File too large to read: {} bytes (limit {})",
            size, MAX_READ_BYTES
        )));
    }

    let content = fs::read_to_string(&verified)
        .map_err(|e| ToolError::Generic(format!("Failed to read {}: {}", path, e)))?;

    Ok(Value::String(content))
}

/// Write content to a file, overwriting or appending
pub async fn write_file(path: &str, content: &str, append: bool, jail: &PathJail) -> Result<Value> {
    let verified = jail.verify(path)?;

    if let Some(parent) = verified.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    if append {
        use std::io::Write;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&verified)?;
        file.write_all(content.as_bytes())?;
    } else {
        fs::write(&verified, content)?;
    }

    Ok(json!({
        "path": verified.to_string_lossy(),
        "bytes_written": content.len(),
    }))
}

/// List directory contents
pub async fn list_dir(path: &str, recursive: bool, jail: &PathJail) -> Result<Value> {
    let verified = jail.verify(path)?;

    if !verified.exists() {
        return Err(ToolError::Generic(format!(
            "Directory not found: {}",
            path
        )));
    }
    if !verified.is_dir() {
        return Err(ToolError::ValidationError(format!(
            "Path is not a directory: {}",
            path
        )));
    }

    let entries = if recursive {
        let mut entries = Vec::new();
        collect_recursive(&verified, &verified, &mut entries)?;
        entries.sort();
        entries
    } else {
        list_single_level(&verified)?
    };

    Ok(json!(entries))
}

fn list_single_level(path: &Path) -> Result<Vec<String>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();

        let kind = match entry.metadata() {
            Ok(meta) if meta.is_dir() => "dir",
            Ok(meta) if meta.is_file() => "file",
            _ => "other",
        };

        entries.push(format!("{} {}", kind, name));
    }

    entries.sort();
    Ok(entries)
}

fn collect_recursive(base: &Path, current: &Path, entries: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(base).unwrap_or(&path);
        let name = relative.to_string_lossy().to_string();

        if path.is_dir() {
            entries.push(format!("dir {}/", name));
            collect_recursive(base, &path, entries)?;
        } else {
            entries.push(format!("file {}", name));
        }
    }

    Ok(())
}
