//! # routier
//!
//! **routier** is a declaration-driven HTTP routing engine. A registered set
//! of route declarations is compiled into a deterministic request→handler
//! dispatch pipeline: match, authorize, run pipeline stages, run route
//! middleware, dispatch.
//!
//! The engine operates on already-parsed request values; connection
//! handling, TLS, and the wire protocol belong to the host.
//!
//! ## Architecture
//!
//! - **[`route`]** - Immutable route definitions, compiled path patterns,
//!   and the builder/group declaration DSL
//! - **[`collection`]** - The route table: exact index, ordered pattern
//!   lists, name index, and duplicate-registration policies
//! - **[`matcher`]** - Request→route matching with `ANY` fallback, domain
//!   gates, parameter extraction, and 405-vs-404 classification
//! - **[`pipeline`]** - Validated stage/middleware chains around the
//!   terminal dispatcher, plus authorization injection
//! - **[`loader`]** - Cache and declaration-source loading strategies with
//!   priority negotiation and fallback
//! - **[`cache`]** - The signed route-table artifact (SHA-256 sidecar)
//! - **[`kernel`]** - The `resolve(request) -> response` façade over an
//!   atomically swappable table
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use routier::http::{Method, Request, Response};
//! use routier::pipeline::{ComponentRegistry, PipelineFactory};
//! use routier::route::Registrar;
//! use routier::collection::RouteCollection;
//! use routier::kernel::RouterKernel;
//!
//! let mut registrar = Registrar::new();
//! registrar
//!     .get("/users/{id}")
//!     .unwrap()
//!     .constraint("id", "[0-9]+")
//!     .action(|req: Request| {
//!         Response::ok_json(req.attribute("id").cloned().unwrap_or_default())
//!     });
//!
//! let mut table = RouteCollection::new();
//! for route in registrar.flush().unwrap() {
//!     table.add_route(route).unwrap();
//! }
//!
//! let factory = PipelineFactory::new(Arc::new(ComponentRegistry::new()), Vec::new());
//! let kernel = RouterKernel::new(table, factory);
//! let response = kernel.resolve(Request::new(Method::Get, "/users/42"));
//! assert_eq!(response.status, 200);
//! ```

pub mod cache;
pub mod collection;
pub mod error;
pub mod fs;
pub mod http;
pub mod kernel;
pub mod loader;
pub mod matcher;
pub mod pipeline;
pub mod route;

pub use collection::{CollectionStatistics, DuplicatePolicy, RouteCollection};
pub use error::{Result, RouterError};
pub use http::{Method, Request, Response};
pub use kernel::RouterKernel;
pub use matcher::{match_request, RouteMatch};
pub use pipeline::{
    AuthorizationGate, ComponentRegistry, Handler, Middleware, PipelineFactory, Stage,
};
pub use route::{Action, Registrar, RouteBuilder, RouteDefinition, RouteGroupContext};
