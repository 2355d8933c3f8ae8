use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, RouterError};
use crate::http::{Request, Response};
use crate::pipeline::authorize::AUTHORIZE_MIDDLEWARE_ID;
use crate::pipeline::registry::ServiceResolver;
use crate::route::{Action, RouteDefinition};

/// A fully composed chain link: takes the request, produces the response.
pub type Handler = Arc<dyn Fn(Request) -> Response + Send + Sync>;

/// Pipeline stage capability.
///
/// Stages run in a fixed slot before route middleware. The trait is shaped
/// like [`Middleware`] on purpose (both wrap the rest of the chain), but
/// the two capabilities are distinct: assembly rejects any identifier that
/// resolves as both.
pub trait Stage: Send + Sync {
    fn handle(&self, request: Request, next: &Handler) -> Response;
}

/// Route middleware capability.
pub trait Middleware: Send + Sync {
    fn handle(&self, request: Request, next: &Handler) -> Response;
}

/// Assembles validated execution chains.
///
/// Holds the configured pipeline stages (shared by every route) and the
/// service resolver. Chain assembly validates the full ordering contract
/// (duplicate identifiers, unresolvable components, stage/middleware
/// cross-contamination) before composing anything, so a misconfigured
/// deployment fails at boot/warm-up rather than mid-request.
pub struct PipelineFactory {
    resolver: Arc<dyn ServiceResolver>,
    stages: Vec<String>,
}

impl PipelineFactory {
    #[must_use]
    pub fn new(resolver: Arc<dyn ServiceResolver>, stages: Vec<String>) -> Self {
        Self { resolver, stages }
    }

    /// Configured stage identifiers.
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    /// Build the chain for a matched route.
    ///
    /// If the route declares an authorization policy, the reserved
    /// `router.authorize` middleware is prepended to the route's middleware
    /// for this chain only; the route itself is never mutated.
    pub fn chain_for_route(&self, route: &RouteDefinition) -> Result<Handler> {
        let core = self.core_dispatcher(route)?;
        let mut middleware: Vec<String> = Vec::with_capacity(route.middleware().len() + 1);
        if route.authorization().is_some() {
            middleware.push(AUTHORIZE_MIDDLEWARE_ID.to_string());
        }
        middleware.extend(route.middleware().iter().cloned());
        self.create(&self.stages, &middleware, core)
    }

    /// Resolve the terminal dispatcher from the route action.
    fn core_dispatcher(&self, route: &RouteDefinition) -> Result<Handler> {
        match route.action() {
            Action::Closure(f) => Ok(Arc::clone(f) as Handler),
            Action::Named(name) => {
                self.resolver
                    .resolve_handler(name)
                    .ok_or_else(|| RouterError::ComponentResolutionFailure { id: name.clone() })
            }
            Action::Controller { class, method } => self
                .resolver
                .resolve_controller(class, method)
                .ok_or_else(|| RouterError::ComponentResolutionFailure {
                    id: format!("{class}@{method}"),
                }),
        }
    }

    /// Compose `stages` and `middleware` around `core`, right to left.
    ///
    /// Fails with [`RouterError::StageOrderViolation`] when an identifier
    /// appears twice anywhere in the combined list, when a listed stage or
    /// middleware resolves with the wrong capability, or when an identifier
    /// satisfies both capability contracts. Unresolvable identifiers fail
    /// with [`RouterError::ComponentResolutionFailure`].
    pub fn create(&self, stages: &[String], middleware: &[String], core: Handler) -> Result<Handler> {
        let mut seen = HashSet::new();
        for id in stages.iter().chain(middleware) {
            if !seen.insert(id.as_str()) {
                return Err(RouterError::StageOrderViolation(format!(
                    "component '{id}' appears more than once in the pipeline"
                )));
            }
        }

        let mut resolved_stages = Vec::with_capacity(stages.len());
        for id in stages {
            if self.resolver.resolve_middleware(id).is_some() {
                return Err(RouterError::StageOrderViolation(format!(
                    "'{id}' is listed as a stage but also satisfies the middleware contract"
                )));
            }
            let stage = self
                .resolver
                .resolve_stage(id)
                .ok_or_else(|| RouterError::ComponentResolutionFailure { id: id.clone() })?;
            resolved_stages.push((id.as_str(), stage));
        }

        let mut resolved_middleware = Vec::with_capacity(middleware.len());
        for id in middleware {
            if self.resolver.resolve_stage(id).is_some() {
                return Err(RouterError::StageOrderViolation(format!(
                    "'{id}' is listed as middleware but also satisfies the stage contract"
                )));
            }
            let mw = self
                .resolver
                .resolve_middleware(id)
                .ok_or_else(|| RouterError::ComponentResolutionFailure { id: id.clone() })?;
            resolved_middleware.push((id.as_str(), mw));
        }

        debug!(
            stages = ?stages,
            middleware = ?middleware,
            "Pipeline chain assembled"
        );

        // Right-to-left composition: the innermost link is the core
        // dispatcher, middleware wrap it, stages wrap the middleware.
        let mut chain = core;
        for (_, mw) in resolved_middleware.into_iter().rev() {
            let next = chain;
            chain = Arc::new(move |req: Request| mw.handle(req, &next));
        }
        for (_, stage) in resolved_stages.into_iter().rev() {
            let next = chain;
            chain = Arc::new(move |req: Request| stage.handle(req, &next));
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::pipeline::registry::ComponentRegistry;
    use serde_json::json;

    struct Tag(&'static str);

    impl Stage for Tag {
        fn handle(&self, mut request: Request, next: &Handler) -> Response {
            annotate(&mut request, self.0);
            next(request)
        }
    }

    impl Middleware for Tag {
        fn handle(&self, mut request: Request, next: &Handler) -> Response {
            annotate(&mut request, self.0);
            next(request)
        }
    }

    fn annotate(request: &mut Request, tag: &str) {
        let trail = request
            .attributes
            .entry("trail".to_string())
            .or_insert_with(|| json!([]));
        if let Some(items) = trail.as_array_mut() {
            items.push(json!(tag));
        }
    }

    fn echo_trail() -> Handler {
        Arc::new(|req: Request| {
            Response::ok_json(req.attribute("trail").cloned().unwrap_or(json!([])))
        })
    }

    #[test]
    fn chain_runs_stages_before_middleware() {
        let mut registry = ComponentRegistry::new();
        registry.register_stage("boot", Arc::new(Tag("stage:boot")));
        registry.register_middleware("auth", Arc::new(Tag("mw:auth")));
        registry.register_middleware("throttle", Arc::new(Tag("mw:throttle")));
        let factory = PipelineFactory::new(Arc::new(registry), vec!["boot".into()]);

        let chain = factory
            .create(
                &["boot".to_string()],
                &["auth".to_string(), "throttle".to_string()],
                echo_trail(),
            )
            .unwrap();
        let res = chain(Request::new(Method::Get, "/x"));
        assert_eq!(res.body, json!(["stage:boot", "mw:auth", "mw:throttle"]));
    }

    #[test]
    fn duplicate_component_id_is_rejected() {
        let mut registry = ComponentRegistry::new();
        registry.register_middleware("auth", Arc::new(Tag("a")));
        let factory = PipelineFactory::new(Arc::new(registry), Vec::new());
        let err = factory
            .create(&[], &["auth".to_string(), "auth".to_string()], echo_trail())
            .err().unwrap();
        assert!(matches!(err, RouterError::StageOrderViolation(_)));
    }

    #[test]
    fn cross_contamination_is_rejected_both_ways() {
        let mut registry = ComponentRegistry::new();
        // Same id registered under both capabilities.
        registry.register_stage("both", Arc::new(Tag("s")));
        registry.register_middleware("both", Arc::new(Tag("m")));
        let factory = PipelineFactory::new(Arc::new(registry), Vec::new());

        let err = factory
            .create(&["both".to_string()], &[], echo_trail())
            .err().unwrap();
        assert!(matches!(err, RouterError::StageOrderViolation(_)));
        let err = factory
            .create(&[], &["both".to_string()], echo_trail())
            .err().unwrap();
        assert!(matches!(err, RouterError::StageOrderViolation(_)));
    }

    #[test]
    fn unknown_component_fails_resolution() {
        let factory = PipelineFactory::new(Arc::new(ComponentRegistry::new()), Vec::new());
        let err = factory
            .create(&[], &["ghost".to_string()], echo_trail())
            .err().unwrap();
        assert!(matches!(
            err,
            RouterError::ComponentResolutionFailure { .. }
        ));
    }

    #[test]
    fn middleware_can_short_circuit() {
        struct Deny;
        impl Middleware for Deny {
            fn handle(&self, _request: Request, _next: &Handler) -> Response {
                Response::error_json(401, "denied")
            }
        }
        let mut registry = ComponentRegistry::new();
        registry.register_middleware("deny", Arc::new(Deny));
        registry.register_middleware("after", Arc::new(Tag("after")));
        let factory = PipelineFactory::new(Arc::new(registry), Vec::new());
        let chain = factory
            .create(
                &[],
                &["deny".to_string(), "after".to_string()],
                echo_trail(),
            )
            .unwrap();
        let res = chain(Request::new(Method::Get, "/x"));
        assert_eq!(res.status, 401);
    }
}
