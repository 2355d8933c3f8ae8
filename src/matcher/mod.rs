//! Request→route matching.
//!
//! Given the route table and a parsed request, [`match_request`] finds the
//! single best matching route: exact index first, then the pattern list in
//! registration order, with `ANY` tried after the literal method. Domain
//! constraints are evaluated against the request host using compiled,
//! process-cached patterns. A failed match is classified as 405 (some other
//! method would match the path) or 404.

mod core;
mod domain;

pub use self::core::{match_request, ParamVec, RouteMatch, MAX_INLINE_PARAMS};
pub use domain::match_domain;
