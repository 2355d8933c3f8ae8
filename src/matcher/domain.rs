//! Host-pattern matching for domain-constrained routes.
//!
//! Domain patterns use the same placeholder syntax as paths
//! (`{tenant}.example.com`). Each distinct pattern is compiled once and
//! cached process-wide; matching is case-insensitive on the host.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, RouterError};

static DOMAIN_CACHE: Lazy<DashMap<String, Regex>> = Lazy::new(DashMap::new);

fn valid_label_param(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Compile a domain pattern into an anchored, case-insensitive regex.
fn compile_domain_pattern(pattern: &str) -> Result<Regex> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?i)^");
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let close = rest[open..].find('}').ok_or_else(|| {
            RouterError::InvalidRoute(format!("unclosed placeholder in domain pattern '{pattern}'"))
        })? + open;
        out.push_str(&regex::escape(&rest[..open]));
        let name = &rest[open + 1..close];
        if !valid_label_param(name) {
            return Err(RouterError::InvalidRoute(format!(
                "invalid placeholder '{name}' in domain pattern '{pattern}'"
            )));
        }
        out.push_str(&format!("(?P<{name}>[^.]+)"));
        rest = &rest[close + 1..];
    }
    out.push_str(&regex::escape(rest));
    out.push('$');
    Regex::new(&out).map_err(|e| {
        RouterError::InvalidRoute(format!("failed to compile domain pattern '{pattern}': {e}"))
    })
}

/// Match a request host against a route's domain pattern.
///
/// Returns `None` on mismatch, or the placeholder captures on success. The
/// compiled pattern is cached for subsequent requests; an uncompilable
/// pattern (which registration should have caught) is treated as a
/// mismatch.
#[must_use]
pub fn match_domain(pattern: &str, host: &str) -> Option<Vec<(String, String)>> {
    // Hosts may arrive with a port; the pattern constrains the name only.
    let host = host.split(':').next().unwrap_or(host);

    if let Some(regex) = DOMAIN_CACHE.get(pattern) {
        return captures(&regex, host);
    }
    let regex = compile_domain_pattern(pattern).ok()?;
    let result = captures(&regex, host);
    DOMAIN_CACHE.insert(pattern.to_string(), regex);
    result
}

fn captures(regex: &Regex, host: &str) -> Option<Vec<(String, String)>> {
    let caps = regex.captures(host)?;
    let params = regex
        .capture_names()
        .flatten()
        .filter_map(|name| {
            caps.name(name)
                .map(|m| (name.to_string(), m.as_str().to_string()))
        })
        .collect();
    Some(params)
}
