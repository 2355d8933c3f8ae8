//! Filesystem collaborator interface.
//!
//! The loaders and the cache layer only need exists/read/write, so they
//! consume this narrow trait instead of `std::fs` directly. Tests swap in
//! temp directories, hosts can swap in whatever storage they like.

use std::path::Path;

/// Read/write/exists operations, as consumed by the cache and loaders.
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn get(&self, path: &Path) -> anyhow::Result<Vec<u8>>;
    fn put(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()>;
}

/// `std::fs`-backed implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn get(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn put(&self, path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(path, bytes)?)
    }
}
