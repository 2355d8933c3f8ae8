//! Route model: immutable definitions, compiled patterns, and the
//! builder/group declaration DSL.
//!
//! A route is declared through a [`Registrar`] (or a bare [`RouteBuilder`]),
//! finalized with an explicit `build()`/`flush()`, and from then on treated
//! as an immutable value. Path patterns are compiled exactly once, at
//! construction.

mod builder;
mod definition;
mod group;
pub mod pattern;

pub use builder::RouteBuilder;
pub use definition::{Action, RouteDefinition, RouteParts, RESERVED_NAME_PREFIX};
pub use group::{Registrar, RouteGroupContext};
