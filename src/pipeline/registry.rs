use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::core::{Handler, Middleware, Stage};

/// Service-resolution collaborator.
///
/// The engine instantiates nothing itself: stages, middleware, named
/// handlers, and controller dispatchers are all produced by the resolver.
/// Stages and middleware resolve through separate lookups so pipeline
/// assembly can detect an identifier registered with both capabilities.
pub trait ServiceResolver: Send + Sync {
    fn resolve_stage(&self, id: &str) -> Option<Arc<dyn Stage>>;
    fn resolve_middleware(&self, id: &str) -> Option<Arc<dyn Middleware>>;
    fn resolve_handler(&self, id: &str) -> Option<Handler>;
    fn resolve_controller(&self, class: &str, method: &str) -> Option<Handler>;
}

/// In-memory [`ServiceResolver`] keyed by string identifiers.
///
/// The default resolver for tests and self-contained deployments; hosts
/// with a real service container implement [`ServiceResolver`] over it
/// instead.
#[derive(Default)]
pub struct ComponentRegistry {
    stages: HashMap<String, Arc<dyn Stage>>,
    middleware: HashMap<String, Arc<dyn Middleware>>,
    handlers: HashMap<String, Handler>,
    controllers: HashMap<String, Handler>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_stage(&mut self, id: impl Into<String>, stage: Arc<dyn Stage>) {
        self.stages.insert(id.into(), stage);
    }

    pub fn register_middleware(&mut self, id: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.middleware.insert(id.into(), middleware);
    }

    pub fn register_handler(&mut self, id: impl Into<String>, handler: Handler) {
        self.handlers.insert(id.into(), handler);
    }

    /// Register the dispatcher for one controller method.
    pub fn register_controller(
        &mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        handler: Handler,
    ) {
        self.controllers
            .insert(format!("{}@{}", class.into(), method.into()), handler);
    }
}

impl ServiceResolver for ComponentRegistry {
    fn resolve_stage(&self, id: &str) -> Option<Arc<dyn Stage>> {
        self.stages.get(id).cloned()
    }

    fn resolve_middleware(&self, id: &str) -> Option<Arc<dyn Middleware>> {
        self.middleware.get(id).cloned()
    }

    fn resolve_handler(&self, id: &str) -> Option<Handler> {
        self.handlers.get(id).cloned()
    }

    fn resolve_controller(&self, class: &str, method: &str) -> Option<Handler> {
        self.controllers.get(&format!("{class}@{method}")).cloned()
    }
}
