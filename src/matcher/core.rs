use std::borrow::Cow;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::collection::RouteCollection;
use crate::error::{Result, RouterError};
use crate::http::{Method, Request};
use crate::matcher::domain::match_domain;
use crate::route::pattern::normalize_path;
use crate::route::RouteDefinition;

/// Maximum number of extracted parameters before heap allocation.
/// Most routes carry a handful of placeholders at most.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// ASCII control characters are stripped from extracted parameter values;
/// everything else passes through undecoded a second time.
#[allow(clippy::expect_used)]
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1f\x7f]").expect("sanitizer regex is valid"));

/// Result of successfully matching a request against the route table.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route (shared with the table)
    pub route: Arc<RouteDefinition>,
    /// Extracted parameters: domain captures, path captures, then defaults
    /// for anything still absent
    pub params: ParamVec,
}

impl RouteMatch {
    /// Get an extracted parameter by name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn sanitize(value: &str) -> String {
    UNSAFE_CHARS.replace_all(value, "").into_owned()
}

/// URL-decode and normalize a request path before matching.
fn decode_request_path(path: &str) -> String {
    let without_query = path.split('?').next().unwrap_or(path);
    let decoded: Cow<'_, str> = urlencoding::decode(without_query)
        .unwrap_or(Cow::Borrowed(without_query));
    normalize_path(&decoded)
}

fn push_param(params: &mut ParamVec, name: &str, value: &str) {
    params.push((name.to_string(), sanitize(value)));
}

/// Evaluate one pattern route against the decoded request path and host.
fn try_route(
    route: &Arc<RouteDefinition>,
    path: &str,
    host: Option<&str>,
) -> Option<ParamVec> {
    let mut params = ParamVec::new();

    if let Some(pattern) = route.domain() {
        let host = host?;
        let domain_params = match_domain(pattern, host)?;
        for (name, value) in &domain_params {
            push_param(&mut params, name, value);
        }
    }

    let caps = route.pattern().regex.captures(path)?;
    // Named groups only; positional captures are never surfaced.
    for name in route.param_names() {
        if let Some(m) = caps.name(name) {
            push_param(&mut params, name, m.as_str());
        }
    }
    Some(params)
}

/// Apply route defaults to parameters absent from the extracted set,
/// never overwriting a present value.
fn apply_defaults(route: &RouteDefinition, params: &mut ParamVec) {
    for (name, value) in route.defaults() {
        if params.iter().any(|(k, _)| k == name) {
            continue;
        }
        let rendered = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push((name.clone(), rendered));
    }
}

/// Find the single best matching route for a request.
///
/// Candidate methods are tried in order: the literal request method, then
/// `ANY`. Within one method the exact index wins over the pattern list, and
/// the pattern list is scanned in registration order: first satisfying
/// route wins, no backtracking within a method.
///
/// On no match, the failure distinguishes 405 from 404: if any route's
/// pattern matches the path under some other method, the error carries the
/// sorted list of methods that would match.
pub fn match_request(table: &RouteCollection, request: &Request) -> Result<RouteMatch> {
    let path = decode_request_path(&request.path);
    let host = request.host.as_deref();

    debug!(method = %request.method, path = %path, "Route match attempt");

    let mut candidates: SmallVec<[Method; 2]> = SmallVec::new();
    candidates.push(request.method);
    if request.method != Method::Any {
        candidates.push(Method::Any);
    }

    for method in candidates {
        if let Some(route) = table.find_exact_route(method, &path) {
            let mut params = ParamVec::new();
            apply_defaults(&route, &mut params);
            debug!(method = %request.method, path = %path, route = %route.path(), "Route matched (exact)");
            return Ok(RouteMatch { route, params });
        }
        for route in table.pattern_routes(method) {
            if let Some(mut params) = try_route(route, &path, host) {
                apply_defaults(route, &mut params);
                debug!(
                    method = %request.method,
                    path = %path,
                    route = %route.path(),
                    params = ?params,
                    "Route matched"
                );
                return Ok(RouteMatch {
                    route: Arc::clone(route),
                    params,
                });
            }
        }
    }

    // Nothing matched; decide between 405 and 404 by scanning the table
    // with the method ignored.
    let allowed = allowed_methods(table, &path, host);
    if allowed.is_empty() {
        warn!(method = %request.method, path = %path, "No route matched");
        Err(RouterError::RouteNotFound {
            method: request.method,
            path,
        })
    } else {
        warn!(method = %request.method, path = %path, allowed = ?allowed, "Method not allowed");
        Err(RouterError::MethodNotAllowed { allowed })
    }
}

/// Concrete methods whose routes match the path (domain gate included),
/// sorted by method token.
fn allowed_methods(table: &RouteCollection, path: &str, host: Option<&str>) -> Vec<Method> {
    let mut allowed: Vec<Method> = Method::CONCRETE
        .into_iter()
        .filter(|method| {
            table.find_exact_route(*method, path).is_some()
                || table
                    .pattern_routes(*method)
                    .iter()
                    .any(|route| try_route(route, path, host).is_some())
        })
        .collect();
    allowed.sort_by_key(Method::as_str);
    allowed
}
