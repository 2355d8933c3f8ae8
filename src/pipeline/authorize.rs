use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::http::{Request, Response};
use crate::pipeline::core::{Handler, Middleware};

/// Request attribute carrying the matched route's authorization policy id.
/// Stamped by the kernel before the pipeline executes.
pub const AUTHORIZATION_ATTRIBUTE: &str = "router.authorization";

/// Reserved middleware identifier for the built-in policy check. Lives in
/// the `router.` namespace so user routes can never shadow it.
pub const AUTHORIZE_MIDDLEWARE_ID: &str = "router.authorize";

/// Authorization policy evaluator, supplied by the host.
///
/// Policy semantics are external to the engine; the pipeline only needs a
/// yes/no answer for a policy id and the annotated request.
pub trait AuthorizationGate: Send + Sync {
    fn authorize(&self, policy: &str, request: &Request) -> bool;
}

/// Built-in middleware that enforces the policy named in
/// [`AUTHORIZATION_ATTRIBUTE`].
///
/// Prepended (by id) to the middleware list of any route that declares an
/// authorization policy. A request without the attribute passes through;
/// the kernel only stamps it for routes that require it.
pub struct PolicyCheckMiddleware {
    gate: Arc<dyn AuthorizationGate>,
}

impl PolicyCheckMiddleware {
    #[must_use]
    pub fn new(gate: Arc<dyn AuthorizationGate>) -> Self {
        Self { gate }
    }
}

impl Middleware for PolicyCheckMiddleware {
    fn handle(&self, request: Request, next: &Handler) -> Response {
        let policy = match request.attribute(AUTHORIZATION_ATTRIBUTE) {
            Some(Value::String(policy)) => policy.clone(),
            _ => return next(request),
        };
        if self.gate.authorize(&policy, &request) {
            next(request)
        } else {
            warn!(policy = %policy, path = %request.path, "Authorization denied");
            Response::error_json(403, &format!("authorization policy '{policy}' denied"))
        }
    }
}
