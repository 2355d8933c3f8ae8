use std::collections::HashMap;

use serde_json::Value;

use crate::http::Method;

/// An already-parsed HTTP request, as handed to the engine by the host.
///
/// Headers use lowercase keys. `attributes` is a free-form bag: the kernel
/// writes extracted path parameters, route defaults, and the authorization
/// policy id into it before the pipeline runs, and middleware may annotate
/// it further on the way down the chain.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (raw, possibly percent-encoded)
    pub path: String,
    /// Request host, if the transport supplied one
    pub host: Option<String>,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Free-form request annotations
    pub attributes: HashMap<String, Value>,
}

impl Request {
    /// Build a request with empty headers and attributes.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            host: None,
            headers: HashMap::new(),
            attributes: HashMap::new(),
        }
    }

    /// Set the request host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Get a header by name (case-insensitive lookup on the stored lowercase keys).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Get a request attribute by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Set a request attribute, returning any previous value.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.attributes.insert(key.into(), value)
    }
}
