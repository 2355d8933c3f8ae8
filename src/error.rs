use std::fmt;

use crate::http::Method;

/// Routing engine error taxonomy.
///
/// Registration-time variants (`InvalidRoute`, `ReservedRouteName`,
/// `DuplicateRoute`) abort bootstrap before any request is served.
/// Request-time variants (`RouteNotFound`, `MethodNotAllowed`,
/// `InvalidRequest`) are normal outcomes that the kernel translates into
/// structured error responses. `StageOrderViolation` and
/// `ComponentResolutionFailure` are configuration bugs surfaced eagerly at
/// pipeline assembly. `CacheIntegrityFailure` is recoverable: the bootstrap
/// falls back to the source loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Malformed route construction input (bad method, path, action, or
    /// constraint pattern).
    InvalidRoute(String),
    /// Route name collides with the reserved `router.` namespace.
    ReservedRouteName {
        /// The offending route name
        name: String,
    },
    /// A route with the same `METHOD|DOMAIN|PATH` key is already registered.
    DuplicateRoute {
        /// The composite dedup key of the conflicting registration
        key: String,
    },
    /// The request carries an HTTP method token the engine does not know.
    InvalidRequest {
        /// The unrecognized method token
        method: String,
    },
    /// No route matches the request path for any candidate method.
    RouteNotFound {
        /// Request method
        method: Method,
        /// Request path (normalized)
        path: String,
    },
    /// The path matches at least one route, but not for the request method.
    MethodNotAllowed {
        /// Sorted list of methods that would match the path
        allowed: Vec<Method>,
    },
    /// Cache artifact is missing, corrupt, or fails signature validation.
    CacheIntegrityFailure(String),
    /// Pipeline assembly contract broken: duplicate component id, a stage
    /// registered as middleware, or vice versa.
    StageOrderViolation(String),
    /// The service resolver could not produce a stage/middleware instance.
    ComponentResolutionFailure {
        /// The component identifier that failed to resolve
        id: String,
    },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::InvalidRoute(reason) => {
                write!(f, "invalid route: {reason}")
            }
            RouterError::ReservedRouteName { name } => {
                write!(
                    f,
                    "route name '{name}' collides with the reserved 'router.' namespace"
                )
            }
            RouterError::DuplicateRoute { key } => {
                write!(f, "duplicate route registration for '{key}'")
            }
            RouterError::InvalidRequest { method } => {
                write!(f, "unsupported HTTP method token '{method}'")
            }
            RouterError::RouteNotFound { method, path } => {
                write!(f, "no route matches {method} {path}")
            }
            RouterError::MethodNotAllowed { allowed } => {
                let allowed: Vec<String> = allowed.iter().map(Method::to_string).collect();
                write!(f, "method not allowed; allowed: {}", allowed.join(", "))
            }
            RouterError::CacheIntegrityFailure(reason) => {
                write!(f, "route cache integrity failure: {reason}")
            }
            RouterError::StageOrderViolation(reason) => {
                write!(f, "pipeline ordering contract violated: {reason}")
            }
            RouterError::ComponentResolutionFailure { id } => {
                write!(f, "failed to resolve pipeline component '{id}'")
            }
        }
    }
}

impl std::error::Error for RouterError {}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RouterError>;
