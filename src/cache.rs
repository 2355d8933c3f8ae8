//! Signed route-table cache.
//!
//! The writer serializes the full route table to a JSON array of scalar
//! records and stores a SHA-256 signature of the artifact's byte content in
//! a `.sig` sidecar. The reader refuses to trust any artifact whose
//! signature does not recompute: corruption or tampering makes the cache
//! unavailable (and bootstrap falls back to the source loader), never a
//! crash.
//!
//! Closure actions cannot survive serialization; [`CachedAction`] has no
//! closure variant, so the exclusion is enforced at write time by the type
//! system rather than by a read-time instance check.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::collection::RouteCollection;
use crate::error::{Result, RouterError};
use crate::fs::Filesystem;
use crate::http::Method;
use crate::route::{Action, RouteDefinition, RouteParts};

/// Serializable action: every [`Action`] variant except `Closure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CachedAction {
    Controller { class: String, method: String },
    Named { handler: String },
}

impl CachedAction {
    fn from_action(action: &Action, route: &RouteDefinition) -> Result<Self> {
        match action {
            Action::Closure(_) => Err(RouterError::CacheIntegrityFailure(format!(
                "route '{} {}' has a closure action and cannot be cached",
                route.method(),
                route.path()
            ))),
            Action::Controller { class, method } => Ok(CachedAction::Controller {
                class: class.clone(),
                method: method.clone(),
            }),
            Action::Named(handler) => Ok(CachedAction::Named {
                handler: handler.clone(),
            }),
        }
    }

    fn into_action(self) -> Action {
        match self {
            CachedAction::Controller { class, method } => Action::Controller { class, method },
            CachedAction::Named { handler } => Action::Named(handler),
        }
    }
}

/// One route record in the cache artifact. Extracted request parameters are
/// request-time state and are never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedRoute {
    pub method: Method,
    pub path: String,
    pub action: CachedAction,
    pub middleware: Vec<String>,
    pub name: String,
    pub constraints: HashMap<String, String>,
    pub defaults: HashMap<String, Value>,
    pub domain: Option<String>,
    pub attributes: HashMap<String, Value>,
    pub authorization: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl CachedRoute {
    /// Snapshot a route for serialization. Fails for closure actions.
    pub fn from_route(route: &RouteDefinition) -> Result<Self> {
        Ok(Self {
            method: route.method(),
            path: route.path().to_string(),
            action: CachedAction::from_action(route.action(), route)?,
            middleware: route.middleware().to_vec(),
            name: route.name().to_string(),
            constraints: route.constraints().clone(),
            defaults: route.defaults().clone(),
            domain: route.domain().map(str::to_string),
            attributes: route.attributes().clone(),
            authorization: route.authorization().map(str::to_string),
            metadata: route.metadata().clone(),
        })
    }

    /// Reconstruct the full route, re-running construction validation and
    /// pattern compilation.
    pub fn into_route(self) -> Result<RouteDefinition> {
        RouteDefinition::from_parts(
            self.method,
            self.action.into_action(),
            RouteParts {
                path: self.path,
                middleware: self.middleware,
                name: self.name,
                constraints: self.constraints,
                defaults: self.defaults,
                domain: self.domain,
                attributes: self.attributes,
                authorization: self.authorization,
                metadata: self.metadata,
            },
        )
    }
}

/// Sidecar path holding the artifact signature.
#[must_use]
pub fn signature_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(".sig");
    PathBuf::from(name)
}

/// SHA-256 of the artifact bytes, lowercase hex.
#[must_use]
pub fn compute_signature(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Serialize the route table and write artifact + signature sidecar.
pub fn write_cache(fs: &dyn Filesystem, artifact: &Path, table: &RouteCollection) -> Result<()> {
    let mut records = Vec::with_capacity(table.len());
    for route in table.all_routes() {
        records.push(CachedRoute::from_route(&route)?);
    }
    let bytes = serde_json::to_vec_pretty(&records)
        .map_err(|e| RouterError::CacheIntegrityFailure(format!("serialization failed: {e}")))?;
    let signature = compute_signature(&bytes);
    fs.put(artifact, &bytes)
        .map_err(|e| RouterError::CacheIntegrityFailure(format!("write failed: {e}")))?;
    fs.put(&signature_path(artifact), signature.as_bytes())
        .map_err(|e| RouterError::CacheIntegrityFailure(format!("signature write failed: {e}")))?;
    info!(
        artifact = %artifact.display(),
        routes = records.len(),
        "Route cache written"
    );
    Ok(())
}

/// Recompute the artifact signature and compare with the sidecar.
///
/// Any unreadable state is "invalid", never an error; the cache is simply
/// unavailable.
#[must_use]
pub fn validate_signature_file(fs: &dyn Filesystem, artifact: &Path) -> bool {
    let Ok(bytes) = fs.get(artifact) else {
        return false;
    };
    let Ok(stored) = fs.get(&signature_path(artifact)) else {
        return false;
    };
    let stored = String::from_utf8_lossy(&stored);
    compute_signature(&bytes) == stored.trim()
}

/// Read, verify, and reconstruct the cached route set.
pub fn read_cache(fs: &dyn Filesystem, artifact: &Path) -> Result<Vec<RouteDefinition>> {
    if !validate_signature_file(fs, artifact) {
        return Err(RouterError::CacheIntegrityFailure(format!(
            "signature validation failed for {}",
            artifact.display()
        )));
    }
    let bytes = fs
        .get(artifact)
        .map_err(|e| RouterError::CacheIntegrityFailure(format!("read failed: {e}")))?;
    let records: Vec<CachedRoute> = serde_json::from_slice(&bytes)
        .map_err(|e| RouterError::CacheIntegrityFailure(format!("corrupt payload: {e}")))?;
    records.into_iter().map(CachedRoute::into_route).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_hex() {
        let sig = compute_signature(b"routes");
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, compute_signature(b"routes"));
        assert_ne!(sig, compute_signature(b"routes!"));
    }

    #[test]
    fn closure_actions_are_rejected_at_write_time() {
        use crate::http::Response;
        use std::sync::Arc;
        let route = RouteDefinition::new(
            Method::Get,
            "/x",
            Action::Closure(Arc::new(|_| Response::ok_json(Value::Null))),
        )
        .unwrap();
        let err = CachedRoute::from_route(&route).unwrap_err();
        assert!(matches!(err, RouterError::CacheIntegrityFailure(_)));
    }

    #[test]
    fn sidecar_path_appends_sig() {
        assert_eq!(
            signature_path(Path::new("/tmp/routes.json")),
            PathBuf::from("/tmp/routes.json.sig")
        );
    }
}
