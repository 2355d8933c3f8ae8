use std::path::PathBuf;
use std::sync::Arc;

use crate::collection::RouteCollection;
use crate::fs::Filesystem;
use crate::loader::RouteLoader;
use crate::route::Registrar;

/// A compiled route-declaration body: runs DSL calls against a registrar.
pub type DeclareFn = Arc<dyn Fn(&mut Registrar) + Send + Sync>;

/// Loads the table by executing route declarations.
///
/// Each `load_into` runs the declaration body against a fresh [`Registrar`],
/// an isolated collector scope, so declarations from one load can never
/// leak into another. Availability is gated on the declaration source file
/// existing on disk, mirroring the cache loader's artifact gate.
pub struct SourceLoader {
    fs: Arc<dyn Filesystem>,
    source_path: PathBuf,
    declare: DeclareFn,
}

impl SourceLoader {
    /// Selection priority of the declaration strategy; the cache wins when
    /// both are available.
    pub const PRIORITY: i32 = 50;

    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>, source_path: impl Into<PathBuf>, declare: DeclareFn) -> Self {
        Self {
            fs,
            source_path: source_path.into(),
            declare,
        }
    }
}

impl RouteLoader for SourceLoader {
    fn load_into(&self, collection: &mut RouteCollection) -> anyhow::Result<()> {
        let mut registrar = Registrar::new();
        (self.declare)(&mut registrar);
        for route in registrar.flush()? {
            collection.add_route(route)?;
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.fs.exists(&self.source_path)
    }

    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn name(&self) -> &str {
        "source"
    }
}
