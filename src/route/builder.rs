use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::http::{Method, Request, Response};
use crate::route::definition::{Action, RouteDefinition, RouteParts};
use crate::route::pattern;

/// Fluent route builder: mutable during construction, terminal
/// [`build`](RouteBuilder::build) produces the immutable [`RouteDefinition`].
///
/// Registration is explicit: nothing happens when a builder is dropped.
/// The [`Registrar`](crate::route::Registrar) owns builders created through
/// its verb helpers and finalizes them on `flush()`.
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    method: Method,
    path: String,
    action: Option<Action>,
    middleware: Vec<String>,
    name: String,
    name_prefix: String,
    constraints: HashMap<String, String>,
    defaults: HashMap<String, Value>,
    domain: Option<String>,
    attributes: HashMap<String, Value>,
    authorization: Option<String>,
    metadata: HashMap<String, Value>,
}

impl RouteBuilder {
    /// Start a builder, validating method and path immediately (fail fast,
    /// same path rules as route construction).
    pub fn make(method: Method, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        pattern::validate_path(&path)?;
        Ok(Self {
            method,
            path,
            action: None,
            middleware: Vec::new(),
            name: String::new(),
            name_prefix: String::new(),
            constraints: HashMap::new(),
            defaults: HashMap::new(),
            domain: None,
            attributes: HashMap::new(),
            authorization: None,
            metadata: HashMap::new(),
        })
    }

    /// Set the route name (unique, used for reverse lookup).
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Append middleware identifiers, preserving order.
    pub fn middleware<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Attach a closure handler.
    pub fn action<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Request) -> Response + Send + Sync + 'static,
    {
        self.action = Some(Action::Closure(Arc::new(handler)));
        self
    }

    /// Attach a `[identifier, method]` controller reference.
    pub fn controller(&mut self, class: impl Into<String>, method: impl Into<String>) -> &mut Self {
        self.action = Some(Action::Controller {
            class: class.into(),
            method: method.into(),
        });
        self
    }

    /// Attach a named handler reference.
    pub fn handler(&mut self, name: impl Into<String>) -> &mut Self {
        self.action = Some(Action::Named(name.into()));
        self
    }

    /// Constrain one parameter with a regex fragment.
    pub fn constraint(&mut self, param: impl Into<String>, fragment: impl Into<String>) -> &mut Self {
        self.constraints.insert(param.into(), fragment.into());
        self
    }

    /// Constrain several parameters at once.
    pub fn constraints<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in entries {
            self.constraints.insert(k.into(), v.into());
        }
        self
    }

    /// Default value applied when a parameter is absent from the URL.
    pub fn default_value(&mut self, param: impl Into<String>, value: Value) -> &mut Self {
        self.defaults.insert(param.into(), value);
        self
    }

    /// Several defaults at once.
    pub fn defaults<I, K>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (k, v) in entries {
            self.defaults.insert(k.into(), v);
        }
        self
    }

    /// Restrict the route to a host pattern (e.g. `{tenant}.example.com`).
    pub fn with_domain(&mut self, domain: impl Into<String>) -> &mut Self {
        self.domain = Some(domain.into());
        self
    }

    /// Free-form annotation.
    pub fn attribute(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Several annotations at once.
    pub fn attributes<I, K>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (k, v) in entries {
            self.attributes.insert(k.into(), v);
        }
        self
    }

    /// Require an authorization policy for this route.
    pub fn authorize(&mut self, policy: impl Into<String>) -> &mut Self {
        self.authorization = Some(policy.into());
        self
    }

    /// Free-form metadata entry.
    pub fn metadata(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }

    // Group-context merge hooks (crate-internal, used by RouteGroupContext).

    pub(crate) fn prepend_path_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        self.path = format!("{}/{}", prefix.trim_end_matches('/'), self.path.trim_start_matches('/'));
    }

    pub(crate) fn prepend_middleware(&mut self, ids: &[String]) {
        let mut merged = ids.to_vec();
        merged.append(&mut self.middleware);
        self.middleware = merged;
    }

    pub(crate) fn merge_constraints(&mut self, entries: &HashMap<String, String>) {
        for (k, v) in entries {
            self.constraints.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub(crate) fn merge_defaults(&mut self, entries: &HashMap<String, Value>) {
        for (k, v) in entries {
            self.defaults.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub(crate) fn merge_attributes(&mut self, entries: &HashMap<String, Value>) {
        for (k, v) in entries {
            self.attributes.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub(crate) fn override_domain(&mut self, domain: &str) {
        self.domain = Some(domain.to_string());
    }

    pub(crate) fn override_authorization(&mut self, policy: &str) {
        self.authorization = Some(policy.to_string());
    }

    pub(crate) fn append_name_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        if self.name_prefix.is_empty() {
            self.name_prefix = prefix.to_string();
        } else {
            self.name_prefix = format!("{}.{}", self.name_prefix, prefix);
        }
    }

    /// Finalize into an immutable [`RouteDefinition`], re-validating all
    /// constraints. A route without an action is rejected here.
    pub fn build(&self) -> Result<RouteDefinition> {
        let action = self.action.clone().ok_or_else(|| {
            crate::error::RouterError::InvalidRoute(format!(
                "route '{} {}' has no action",
                self.method, self.path
            ))
        })?;
        let name = if self.name.is_empty() {
            String::new()
        } else if self.name_prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name_prefix, self.name)
        };
        RouteDefinition::from_parts(
            self.method,
            action,
            RouteParts {
                path: self.path.clone(),
                middleware: self.middleware.clone(),
                name,
                constraints: self.constraints.clone(),
                defaults: self.defaults.clone(),
                domain: self.domain.clone(),
                attributes: self.attributes.clone(),
                authorization: self.authorization.clone(),
                metadata: self.metadata.clone(),
            },
        )
    }
}
