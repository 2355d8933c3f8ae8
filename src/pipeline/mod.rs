//! Staged execution pipeline.
//!
//! A matched route runs through a fixed-order chain: pipeline stages first,
//! then route middleware, then the terminal dispatcher built from the
//! route's action. Stages and middleware are distinct capabilities (the
//! same identifier must never satisfy both) and the whole chain is
//! validated once at assembly time, not per request.

mod authorize;
mod core;
mod registry;

pub use authorize::{
    AuthorizationGate, PolicyCheckMiddleware, AUTHORIZATION_ATTRIBUTE, AUTHORIZE_MIDDLEWARE_ID,
};
pub use self::core::{Handler, Middleware, PipelineFactory, Stage};
pub use registry::{ComponentRegistry, ServiceResolver};
