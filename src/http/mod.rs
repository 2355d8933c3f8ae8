//! HTTP value objects consumed by the routing engine.
//!
//! The engine operates on already-parsed requests: connection handling and
//! wire protocol belong to the host. These types expose exactly what route
//! resolution needs: method, path, host, headers, and a free-form attribute
//! bag that the kernel populates with extracted path parameters.

mod method;
mod request;
mod response;

pub use method::Method;
pub use request::Request;
pub use response::Response;
