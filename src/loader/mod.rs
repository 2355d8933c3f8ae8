//! Route source loaders and bootstrap negotiation.
//!
//! Two interchangeable strategies fill the route table: the signed cache
//! artifact (priority 100) and the declaration source (priority 50).
//! Bootstrap picks the highest-priority available loader; a loader failure
//! is logged and the next candidate is tried, so a corrupt cache degrades
//! to a slower boot instead of a crash.

mod cache;
mod source;

pub use cache::CacheLoader;
pub use source::{DeclareFn, SourceLoader};

use anyhow::anyhow;
use tracing::{info, warn};

use crate::collection::RouteCollection;

/// One strategy for filling a [`RouteCollection`].
pub trait RouteLoader: Send + Sync {
    /// Fill the collection; any failure leaves the caller free to fall
    /// back to another loader.
    fn load_into(&self, collection: &mut RouteCollection) -> anyhow::Result<()>;
    /// Whether this loader can run at all (artifact present, signature
    /// valid, source file readable, ...).
    fn is_available(&self) -> bool;
    /// Selection priority; higher wins.
    fn priority(&self) -> i32;
    /// Loader name for logs.
    fn name(&self) -> &str;
}

/// Build a route table from the highest-priority available loader, falling
/// back down the priority order on failure.
pub fn bootstrap(loaders: &[Box<dyn RouteLoader>]) -> anyhow::Result<RouteCollection> {
    let mut candidates: Vec<&dyn RouteLoader> = loaders.iter().map(Box::as_ref).collect();
    candidates.sort_by_key(|l| std::cmp::Reverse(l.priority()));

    for loader in candidates {
        if !loader.is_available() {
            info!(loader = loader.name(), "Route loader unavailable, skipping");
            continue;
        }
        let mut collection = RouteCollection::new();
        match loader.load_into(&mut collection) {
            Ok(()) => {
                info!(
                    loader = loader.name(),
                    routes = collection.len(),
                    "Routing table loaded"
                );
                return Ok(collection);
            }
            Err(e) => {
                warn!(
                    loader = loader.name(),
                    error = %e,
                    "Route loader failed, falling back"
                );
            }
        }
    }
    Err(anyhow!("no available route loader succeeded"))
}
