//! Canonical route storage.
//!
//! The collection keeps two stores per method: an exact index (literal path
//! → route, O(1) lookup) and an ordered pattern list for paths with
//! placeholders. Registration order in the pattern list is significant:
//! the matcher scans it first-registered-first and never reorders it.
//!
//! Built once at bootstrap, read-mostly afterwards. Hot reload replaces the
//! whole collection atomically at the kernel rather than mutating a live
//! one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, RouterError};
use crate::http::Method;
use crate::route::RouteDefinition;

/// Behavior when a registration collides on the `METHOD|DOMAIN|PATH` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail the registration (production default).
    #[default]
    Throw,
    /// Last registration wins (dev/test overrides).
    Replace,
    /// First registration wins.
    Ignore,
}

/// Route-count summary returned by [`RouteCollection::statistics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatistics {
    pub exact_routes: usize,
    pub pattern_routes: usize,
    pub total: usize,
    pub per_method: HashMap<Method, usize>,
}

/// The route table: exact index + ordered pattern lists + name index.
#[derive(Debug, Default, Clone)]
pub struct RouteCollection {
    exact: HashMap<Method, HashMap<String, Arc<RouteDefinition>>>,
    patterns: HashMap<Method, Vec<Arc<RouteDefinition>>>,
    named: HashMap<String, Arc<RouteDefinition>>,
    keys: HashSet<String>,
}

impl RouteCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route under the default [`DuplicatePolicy::Throw`].
    pub fn add_route(&mut self, route: RouteDefinition) -> Result<()> {
        self.add_route_with_policy(route, DuplicatePolicy::Throw)
    }

    /// Register a route with an explicit duplicate policy.
    ///
    /// Under `Throw` a key collision fails without mutating the table;
    /// under `Replace` the prior route is removed from every index
    /// (including the name index) before the new one is inserted; under
    /// `Ignore` the first registration stays and the new one is dropped.
    pub fn add_route_with_policy(
        &mut self,
        route: RouteDefinition,
        policy: DuplicatePolicy,
    ) -> Result<()> {
        let key = route.dedup_key();
        if self.keys.contains(&key) {
            match policy {
                DuplicatePolicy::Throw => {
                    return Err(RouterError::DuplicateRoute { key });
                }
                DuplicatePolicy::Ignore => {
                    debug!(key = %key, "Ignoring duplicate route registration");
                    return Ok(());
                }
                DuplicatePolicy::Replace => {
                    debug!(key = %key, "Replacing existing route registration");
                    self.remove_by_key(&route);
                }
            }
        }

        let route = Arc::new(route);
        if !route.name().is_empty() {
            self.named.insert(route.name().to_string(), Arc::clone(&route));
        }
        // Domain-constrained routes always take the pattern path: the exact
        // index is a bare path lookup and cannot evaluate a host gate.
        if route.is_pattern() || route.domain().is_some() {
            self.patterns
                .entry(route.method())
                .or_default()
                .push(Arc::clone(&route));
        } else {
            self.exact
                .entry(route.method())
                .or_default()
                .insert(route.path().to_string(), Arc::clone(&route));
        }
        self.keys.insert(key);
        Ok(())
    }

    /// Remove the route sharing `route`'s dedup key from every index.
    ///
    /// Mirrors the add-time classification: the colliding route shares
    /// method, domain, and normalized path, so it lives in the store the
    /// incoming route would be filed into. A same-path route in the other
    /// store has a different dedup key and must not be touched.
    fn remove_by_key(&mut self, route: &RouteDefinition) {
        let key = route.dedup_key();
        let method = route.method();
        let removed = if route.is_pattern() || route.domain().is_some() {
            self.patterns.get_mut(&method).and_then(|list| {
                list.iter()
                    .position(|r| r.dedup_key() == key)
                    .map(|idx| list.remove(idx))
            })
        } else {
            self.exact
                .get_mut(&method)
                .and_then(|map| map.remove(route.path()))
        };
        if let Some(prior) = removed {
            if !prior.name().is_empty() {
                self.named.remove(prior.name());
            }
        }
        self.keys.remove(&key);
    }

    /// O(1) lookup of a literal (non-pattern) path.
    #[must_use]
    pub fn find_exact_route(&self, method: Method, path: &str) -> Option<Arc<RouteDefinition>> {
        self.exact.get(&method).and_then(|m| m.get(path)).cloned()
    }

    /// Pattern routes for a method, in registration order.
    #[must_use]
    pub fn pattern_routes(&self, method: Method) -> &[Arc<RouteDefinition>] {
        self.patterns.get(&method).map_or(&[], Vec::as_slice)
    }

    /// All routes for one method: exact entries (sorted by path for
    /// determinism) followed by pattern entries in registration order.
    #[must_use]
    pub fn all_routes_for_method(&self, method: Method) -> Vec<Arc<RouteDefinition>> {
        let mut routes: Vec<Arc<RouteDefinition>> = self
            .exact
            .get(&method)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        routes.sort_by(|a, b| a.path().cmp(b.path()));
        routes.extend(self.pattern_routes(method).iter().cloned());
        routes
    }

    /// All routes, grouped by method in canonical order (`ANY` last).
    #[must_use]
    pub fn all_routes(&self) -> Vec<Arc<RouteDefinition>> {
        let mut routes = Vec::with_capacity(self.keys.len());
        for method in Method::CONCRETE.into_iter().chain([Method::Any]) {
            routes.extend(self.all_routes_for_method(method));
        }
        routes
    }

    /// Reverse lookup by route name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<RouteDefinition>> {
        self.named.get(name).cloned()
    }

    /// Route counts.
    #[must_use]
    pub fn statistics(&self) -> CollectionStatistics {
        let exact_routes: usize = self.exact.values().map(HashMap::len).sum();
        let pattern_routes: usize = self.patterns.values().map(Vec::len).sum();
        let mut per_method = HashMap::new();
        for (method, map) in &self.exact {
            *per_method.entry(*method).or_insert(0) += map.len();
        }
        for (method, list) in &self.patterns {
            *per_method.entry(*method).or_insert(0) += list.len();
        }
        CollectionStatistics {
            exact_routes,
            pattern_routes,
            total: exact_routes + pattern_routes,
            per_method,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Drop every route. Test isolation only; production tables are
    /// replaced wholesale, not cleared in place.
    pub fn clear(&mut self) {
        self.exact.clear();
        self.patterns.clear();
        self.named.clear();
        self.keys.clear();
    }

    /// Re-order every pattern list by descending specificity (stable, so
    /// equal scores keep registration order). Opt-in: the matcher itself
    /// never calls this.
    pub fn sort_patterns_by_specificity(&mut self) {
        for list in self.patterns.values_mut() {
            list.sort_by_key(|r| std::cmp::Reverse(r.specificity()));
        }
    }
}
