//! Path pattern compilation.
//!
//! Route paths are compiled once, at registration, into anchored regexes
//! with named capture groups. Three placeholder forms are supported:
//!
//! - `{name}` - required segment, matches one path segment
//! - `{name?}` - optional segment
//! - `{name*}` - trailing wildcard, swallows the rest of the path; at most
//!   one per route and it must be the final segment
//!
//! A constraint map substitutes per-parameter regex fragments for the
//! default `[^/]+` segment matcher. Compilation failures are registration
//! errors; the matcher never sees an uncompiled pattern.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, RouterError};

/// Characters allowed in a route path besides placeholder syntax.
const PATH_CHARSET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789/-._~{}?*";

/// A route path compiled into its matching artifacts.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Anchored regex with one named group per placeholder
    pub regex: Regex,
    /// Placeholder names in path order
    pub param_names: Vec<String>,
}

impl CompiledPattern {
    /// Number of placeholders in the pattern.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_names.len()
    }
}

/// Normalize a route or request path.
///
/// Collapses repeated separators and strips the trailing slash (the root
/// path stays `/`). Normalization is idempotent; both registration and
/// matching run paths through it, so `/users` and `/users/` are one route.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

/// Count the segments of a normalized path (`/` has zero).
#[must_use]
pub fn segment_count(normalized: &str) -> usize {
    normalized.split('/').filter(|s| !s.is_empty()).count()
}

/// Validate a route path prior to compilation.
///
/// The path must be non-empty, start with `/`, and stay within the allowed
/// character set.
pub fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RouterError::InvalidRoute("path must not be empty".into()));
    }
    if !path.starts_with('/') {
        return Err(RouterError::InvalidRoute(format!(
            "path '{path}' must start with '/'"
        )));
    }
    if let Some(bad) = path.chars().find(|c| !PATH_CHARSET.contains(*c)) {
        return Err(RouterError::InvalidRoute(format!(
            "path '{path}' contains disallowed character '{bad}'"
        )));
    }
    Ok(())
}

/// Whether a path declares any `{placeholder}` and therefore needs the
/// pattern store instead of the exact index.
#[must_use]
pub fn is_pattern_path(path: &str) -> bool {
    path.contains('{') || path.contains('}')
}

fn valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolve the regex fragment for one placeholder, validating any
/// user-supplied constraint.
fn constraint_fragment(
    name: &str,
    constraints: &HashMap<String, String>,
    default: &str,
) -> Result<String> {
    match constraints.get(name) {
        Some(fragment) => {
            // Compile standalone first so the error names the constraint,
            // not the assembled route pattern.
            Regex::new(&format!("^(?:{fragment})$")).map_err(|e| {
                RouterError::InvalidRoute(format!(
                    "constraint for parameter '{name}' is not a valid regex: {e}"
                ))
            })?;
            Ok(format!("(?:{fragment})"))
        }
        None => Ok(default.to_string()),
    }
}

/// Compile a normalized route path into a [`CompiledPattern`].
///
/// `constraints` maps parameter names to regex fragments substituted for
/// the default segment matcher. Every constraint in the map is validated,
/// whether or not its parameter appears in the path.
pub fn compile_path_pattern(
    normalized: &str,
    constraints: &HashMap<String, String>,
) -> Result<CompiledPattern> {
    // Validate the whole constraint map up front; a bad fragment is a
    // registration error even when its parameter is unused.
    for (name, fragment) in constraints {
        Regex::new(&format!("^(?:{fragment})$")).map_err(|e| {
            RouterError::InvalidRoute(format!(
                "constraint for parameter '{name}' is not a valid regex: {e}"
            ))
        })?;
    }

    if normalized == "/" {
        return Ok(CompiledPattern {
            regex: Regex::new("^/$").map_err(|e| {
                RouterError::InvalidRoute(format!("failed to compile root pattern: {e}"))
            })?,
            param_names: Vec::new(),
        });
    }

    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    let mut pattern = String::with_capacity(normalized.len() + 16);
    pattern.push('^');
    let mut param_names = Vec::with_capacity(normalized.matches('{').count());

    for (idx, segment) in segments.iter().enumerate() {
        if segment.starts_with('{') && segment.ends_with('}') {
            let inner = &segment[1..segment.len() - 1];
            let (name, kind) = match inner.chars().last() {
                Some('?') => (&inner[..inner.len() - 1], SegmentKind::Optional),
                Some('*') => (&inner[..inner.len() - 1], SegmentKind::Wildcard),
                _ => (inner, SegmentKind::Required),
            };
            if !valid_param_name(name) {
                return Err(RouterError::InvalidRoute(format!(
                    "invalid parameter name '{name}' in path '{normalized}'"
                )));
            }
            if param_names.iter().any(|n| n == name) {
                return Err(RouterError::InvalidRoute(format!(
                    "parameter '{name}' appears more than once in path '{normalized}'"
                )));
            }
            match kind {
                SegmentKind::Required => {
                    let frag = constraint_fragment(name, constraints, "[^/]+")?;
                    pattern.push_str(&format!("/(?P<{name}>{frag})"));
                }
                SegmentKind::Optional => {
                    let frag = constraint_fragment(name, constraints, "[^/]+")?;
                    pattern.push_str(&format!("(?:/(?P<{name}>{frag}))?"));
                }
                SegmentKind::Wildcard => {
                    if idx != segments.len() - 1 {
                        return Err(RouterError::InvalidRoute(format!(
                            "wildcard parameter '{name}' must be the final segment of '{normalized}'"
                        )));
                    }
                    let frag = constraint_fragment(name, constraints, ".+")?;
                    pattern.push_str(&format!("(?:/(?P<{name}>{frag}))?"));
                }
            }
            param_names.push(name.to_string());
        } else if is_pattern_path(segment) {
            // Braces embedded in a literal segment, e.g. `a{b}c`.
            return Err(RouterError::InvalidRoute(format!(
                "malformed placeholder segment '{segment}' in path '{normalized}'"
            )));
        } else {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }

    pattern.push('$');
    let regex = Regex::new(&pattern).map_err(|e| {
        RouterError::InvalidRoute(format!(
            "failed to compile pattern for path '{normalized}': {e}"
        ))
    })?;

    Ok(CompiledPattern { regex, param_names })
}

enum SegmentKind {
    Required,
    Optional,
    Wildcard,
}
