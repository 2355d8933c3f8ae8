//! Router kernel: the `resolve(request) -> response` orchestration façade.
//!
//! Ties the matcher, the pipeline factory, and fallback handling together
//! over an atomically swappable route table. The table is read through
//! `ArcSwap`, so hot reload replaces the whole collection in one pointer
//! swap while in-flight requests keep the table they started with.

use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde_json::json;
use tracing::{error, info};

use crate::collection::RouteCollection;
use crate::error::{Result, RouterError};
use crate::fs::Filesystem;
use crate::http::{Method, Request, Response};
use crate::loader::{bootstrap, CacheLoader, DeclareFn, RouteLoader, SourceLoader};
use crate::matcher::{match_request, RouteMatch};
use crate::pipeline::{Handler, PipelineFactory, AUTHORIZATION_ATTRIBUTE};
use crate::route::RouteDefinition;

/// Orchestration entry point for request resolution.
pub struct RouterKernel {
    table: ArcSwap<RouteCollection>,
    factory: PipelineFactory,
    chains: DashMap<String, Handler>,
    fallback: Option<Handler>,
}

impl RouterKernel {
    #[must_use]
    pub fn new(table: RouteCollection, factory: PipelineFactory) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            factory,
            chains: DashMap::new(),
            fallback: None,
        }
    }

    /// Install a fallback handler invoked (with the original request) when
    /// no route matches, instead of the structured 404/405 response.
    #[must_use]
    pub fn with_fallback<F>(mut self, handler: F) -> Self
    where
        F: Fn(Request) -> Response + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Resolve one request to a response. Never fails past this boundary:
    /// match failures become structured error responses (or the fallback),
    /// pipeline assembly failures become 500s.
    pub fn resolve(&self, mut request: Request) -> Response {
        let table = self.table.load();

        let matched = match match_request(&table, &request) {
            Ok(m) => m,
            // HEAD resolves transparently as GET when only GET is
            // registered for the path; the host discards the body.
            Err(RouterError::MethodNotAllowed { ref allowed })
                if request.method == Method::Head && allowed.contains(&Method::Get) =>
            {
                let mut as_get = request.clone();
                as_get.method = Method::Get;
                match match_request(&table, &as_get) {
                    Ok(m) => m,
                    Err(e) => return self.no_match_response(request, &e),
                }
            }
            Err(e) => return self.no_match_response(request, &e),
        };

        // Extracted parameters (and route defaults) become request
        // attributes before the pipeline runs.
        for (name, value) in &matched.params {
            request.set_attribute(name.clone(), json!(value));
        }
        if let Some(policy) = matched.route.authorization() {
            request.set_attribute(AUTHORIZATION_ATTRIBUTE, json!(policy));
        }

        match self.chain_for(&matched) {
            Ok(chain) => chain(request),
            Err(e) => {
                error!(route = %matched.route.path(), error = %e, "Pipeline assembly failed");
                Response::error_json(500, &e.to_string())
            }
        }
    }

    fn no_match_response(&self, request: Request, err: &RouterError) -> Response {
        if let Some(fallback) = &self.fallback {
            return fallback(request);
        }
        match err {
            RouterError::MethodNotAllowed { allowed } => {
                let tokens: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                Response::new(
                    405,
                    json!({
                        "error": "method not allowed",
                        "allow": tokens,
                    }),
                )
                .with_header("Allow", tokens.join(", "))
            }
            RouterError::RouteNotFound { method, path } => Response::new(
                404,
                json!({
                    "error": "route not found",
                    "method": method.as_str(),
                    "path": path,
                }),
            ),
            RouterError::InvalidRequest { method } => {
                Response::error_json(400, &format!("unsupported HTTP method '{method}'"))
            }
            other => Response::error_json(500, &other.to_string()),
        }
    }

    /// Cached chain for a matched route, built on first use.
    fn chain_for(&self, matched: &RouteMatch) -> Result<Handler> {
        let key = matched.route.dedup_key();
        if let Some(chain) = self.chains.get(&key) {
            return Ok(Handler::clone(&chain));
        }
        let chain = self.factory.chain_for_route(&matched.route)?;
        self.chains.insert(key, Handler::clone(&chain));
        Ok(chain)
    }

    /// Build and cache every route's chain eagerly so assembly-time
    /// configuration errors surface at boot instead of mid-request.
    pub fn warm_up(&self) -> Result<()> {
        let table = self.table.load();
        for route in table.all_routes() {
            let chain = self.factory.chain_for_route(&route)?;
            self.chains.insert(route.dedup_key(), chain);
        }
        info!(routes = table.len(), "Pipeline chains warmed up");
        Ok(())
    }

    /// Register one more route (copy-on-write table swap; the live table is
    /// never mutated in place).
    pub fn add_route(&self, route: RouteDefinition) -> Result<()> {
        let mut table = RouteCollection::clone(&self.table.load());
        table.add_route(route)?;
        self.table.store(Arc::new(table));
        Ok(())
    }

    /// Atomically replace the whole route table, invalidating cached
    /// chains.
    pub fn replace_table(&self, table: RouteCollection) {
        self.table.store(Arc::new(table));
        self.chains.clear();
        info!("Route table replaced");
    }

    /// Reverse lookup by route name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<RouteDefinition>> {
        self.table.load().get_by_name(name)
    }

    /// Snapshot of every registered route.
    #[must_use]
    pub fn all_routes(&self) -> Vec<Arc<RouteDefinition>> {
        self.table.load().all_routes()
    }

    /// Bootstrap the table from the standard loader pair: the signed cache
    /// artifact under `cache_dir` (priority 100), falling back to the
    /// declaration source (priority 50).
    pub fn load_routes(
        &self,
        fs: Arc<dyn Filesystem>,
        source_path: &Path,
        cache_dir: &Path,
        declare: DeclareFn,
    ) -> anyhow::Result<()> {
        let artifact = cache_dir.join("routes.json");
        let loaders: Vec<Box<dyn RouteLoader>> = vec![
            Box::new(CacheLoader::new(Arc::clone(&fs), artifact)),
            Box::new(SourceLoader::new(fs, source_path, declare)),
        ];
        let table = bootstrap(&loaders)?;
        self.replace_table(table);
        Ok(())
    }

    /// Serialize the current table to a signed cache artifact.
    pub fn write_cache(&self, fs: &dyn Filesystem, artifact: &Path) -> Result<()> {
        crate::cache::write_cache(fs, artifact, &self.table.load())
    }
}
