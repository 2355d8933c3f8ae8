use std::collections::HashMap;

use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Response value produced by a pipeline chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// JSON body
    pub body: Value,
}

impl Response {
    /// Build a response with the given status and JSON body.
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// 200 with a JSON body.
    #[must_use]
    pub fn ok_json(body: Value) -> Self {
        Self::new(200, body)
    }

    /// Structured JSON error body: `{"error": reason, "status": code}`.
    #[must_use]
    pub fn error_json(status: u16, reason: &str) -> Self {
        Self::new(
            status,
            serde_json::json!({
                "error": reason,
                "status": status,
                "reason": status_reason(status),
            }),
        )
    }

    /// Add a header, consuming and returning the response.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
