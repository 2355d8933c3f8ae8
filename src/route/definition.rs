use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, RouterError};
use crate::http::{Method, Request, Response};
use crate::route::pattern::{
    self, compile_path_pattern, normalize_path, segment_count, CompiledPattern,
};

/// Route names under this prefix are reserved for engine internals
/// (e.g. the injected `router.authorize` middleware id).
pub const RESERVED_NAME_PREFIX: &str = "router.";

/// Handler reference attached to a route.
///
/// A closed sum type: dispatch and cache serialization handle every variant
/// exhaustively. `Closure` is the one variant that cannot be cached: the
/// cache writer rejects it at write time, so the cache loader never has to
/// reject it at read time.
#[derive(Clone)]
pub enum Action {
    /// In-process handler function. Not serializable; excluded from cache.
    Closure(Arc<dyn Fn(Request) -> Response + Send + Sync>),
    /// `[identifier, method-name]` pair resolved through the service resolver.
    Controller {
        /// Controller identifier known to the service resolver
        class: String,
        /// Method name on the resolved controller
        method: String,
    },
    /// Named handler resolved through the service resolver.
    Named(String),
}

impl Action {
    /// Whether this action survives a cache round-trip.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Action::Closure(_))
    }

    fn validate(&self) -> Result<()> {
        match self {
            Action::Closure(_) => Ok(()),
            Action::Controller { class, method } => {
                if class.is_empty() || method.is_empty() {
                    Err(RouterError::InvalidRoute(
                        "controller action requires a non-empty [identifier, method] pair".into(),
                    ))
                } else {
                    Ok(())
                }
            }
            Action::Named(name) => {
                if name.is_empty() {
                    Err(RouterError::InvalidRoute(
                        "named action requires a non-empty handler identifier".into(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Closure(_) => f.write_str("Action::Closure(..)"),
            Action::Controller { class, method } => {
                write!(f, "Action::Controller({class}@{method})")
            }
            Action::Named(name) => write!(f, "Action::Named({name})"),
        }
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Action::Closure(a), Action::Closure(b)) => Arc::ptr_eq(a, b),
            (
                Action::Controller { class: c1, method: m1 },
                Action::Controller { class: c2, method: m2 },
            ) => c1 == c2 && m1 == m2,
            (Action::Named(a), Action::Named(b)) => a == b,
            _ => false,
        }
    }
}

/// Raw inputs to [`RouteDefinition::from_parts`].
///
/// Plays the role of keyword arguments: the builder and the cache loader
/// both assemble one of these and hand it over for validation.
#[derive(Debug, Clone, Default)]
pub struct RouteParts {
    pub path: String,
    pub middleware: Vec<String>,
    pub name: String,
    pub constraints: HashMap<String, String>,
    pub defaults: HashMap<String, Value>,
    pub domain: Option<String>,
    pub attributes: HashMap<String, Value>,
    pub authorization: Option<String>,
    pub metadata: HashMap<String, Value>,
}

/// Immutable, validated description of one route.
///
/// Construction normalizes the path and precompiles the matching pattern,
/// so the matcher never recompiles anything at request time. Once built,
/// no field is ever mutated; derived copies are produced for operations
/// such as re-tagging metadata.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    method: Method,
    path: String,
    action: Action,
    middleware: Vec<String>,
    name: String,
    constraints: HashMap<String, String>,
    defaults: HashMap<String, Value>,
    domain: Option<String>,
    attributes: HashMap<String, Value>,
    authorization: Option<String>,
    metadata: HashMap<String, Value>,
    specificity: i64,
    pattern: CompiledPattern,
}

impl RouteDefinition {
    /// Validate and construct a route.
    ///
    /// Validation order: path, action, reserved name, constraints. The
    /// method arrives as a parsed [`Method`], so unsupported tokens are
    /// rejected upstream at parse time.
    pub fn from_parts(method: Method, action: Action, parts: RouteParts) -> Result<Self> {
        pattern::validate_path(&parts.path)?;
        action.validate()?;
        if parts.name.starts_with(RESERVED_NAME_PREFIX) {
            return Err(RouterError::ReservedRouteName { name: parts.name });
        }

        let path = normalize_path(&parts.path);
        let pattern = compile_path_pattern(&path, &parts.constraints)?;
        let specificity = segment_count(&path) as i64 - pattern.param_count() as i64;

        Ok(Self {
            method,
            path,
            action,
            middleware: parts.middleware,
            name: parts.name,
            constraints: parts.constraints,
            defaults: parts.defaults,
            domain: parts.domain,
            attributes: parts.attributes,
            authorization: parts.authorization,
            metadata: parts.metadata,
            specificity,
            pattern,
        })
    }

    /// Shorthand for a bare route with no metadata.
    pub fn new(method: Method, path: impl Into<String>, action: Action) -> Result<Self> {
        Self::from_parts(
            method,
            action,
            RouteParts {
                path: path.into(),
                ..RouteParts::default()
            },
        )
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Normalized route path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    #[must_use]
    pub fn middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Route name; empty means unnamed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn constraints(&self) -> &HashMap<String, String> {
        &self.constraints
    }

    #[must_use]
    pub fn defaults(&self) -> &HashMap<String, Value> {
        &self.defaults
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Precompiled matching pattern.
    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Placeholder names in path order.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.pattern.param_names
    }

    /// Tie-break signal for overlapping patterns: literal segments count
    /// positively, placeholders subtract. The matcher itself never sorts by
    /// this; callers that want specificity precedence pre-sort the table.
    #[must_use]
    pub fn specificity(&self) -> i64 {
        self.specificity
    }

    /// Whether the path declares placeholders (pattern store) or not
    /// (exact index).
    #[must_use]
    pub fn is_pattern(&self) -> bool {
        pattern::is_pattern_path(&self.path)
    }

    /// Composite dedup key: `METHOD|DOMAIN|PATH` (domain empty when unset).
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.method,
            self.domain.as_deref().unwrap_or(""),
            self.path
        )
    }

    /// Derived copy with one extra metadata entry.
    #[must_use]
    pub fn with_metadata(&self, key: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.metadata.insert(key.into(), value);
        copy
    }
}
