use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{read_cache, validate_signature_file};
use crate::collection::RouteCollection;
use crate::fs::Filesystem;
use crate::loader::RouteLoader;

/// Loads the table from the signed cache artifact.
///
/// Available only when the artifact exists and its signature validates.
/// `load_into` re-validates the signature before decoding (defense in
/// depth); availability and trust are checked independently.
pub struct CacheLoader {
    fs: Arc<dyn Filesystem>,
    artifact: PathBuf,
}

impl CacheLoader {
    /// Selection priority of the cache strategy.
    pub const PRIORITY: i32 = 100;

    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            artifact: artifact.into(),
        }
    }
}

impl RouteLoader for CacheLoader {
    fn load_into(&self, collection: &mut RouteCollection) -> anyhow::Result<()> {
        // read_cache re-checks the signature even though is_available
        // already did; the artifact may have changed in between.
        let routes = read_cache(self.fs.as_ref(), &self.artifact)?;
        for route in routes {
            collection.add_route(route)?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.fs.exists(&self.artifact) && validate_signature_file(self.fs.as_ref(), &self.artifact)
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn name(&self) -> &str {
        "cache"
    }
}
