//! HTTP tool implementation
//!
//! Generic HTTP fetch with timeout enforcement and a response size cap.
//! Non-success statuses become errors whose text carries the status
//! line, so the classifier can type them (404 → resource, 403 →
//! permission, 429 → rate limit).

use crate::errors::{Result, ToolError};
use serde_json::{json, Value};
use std::time::Duration;

/// Maximum response body size returned to the model (256KB)
pub const MAX_BODY_BYTES: usize = 262_144;

/// Fetch a URL
pub async fn http_request(url: &str, method: &str, timeout_seconds: u64) -> Result<Value> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;

    let request = match method.to_uppercase().as_str() {
        "GET" => client.get(url),
        "POST" => client.post(url),
        "HEAD" => client.head(url),
        other => {
            return Err(ToolError::ValidationError(format!(
                "Unsupported HTTP method: {}",
                other
            )));
        }
    };

    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(ToolError::Generic(format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("error")
        )));
    }

    let mut body = response.text().await?;
    if body.len() > MAX_BODY_BYTES {
        body.truncate(MAX_BODY_BYTES);
        body.push_str("\n[truncated]");
    }

    Ok(json!({
        "status": status.as_u16(),
        "body": body,
    }))
}
