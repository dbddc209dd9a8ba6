//! Marketstall backend library modules.
//!
//! A REST backend for a business marketplace: sellers list e-commerce
//! businesses for sale; buyers search and favourite listings, ask
//! questions, book appointments, and purchase a premium membership that
//! unlocks listing financials.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request-tracing middleware attaching a `trace-id` to every response.
pub use middleware::Trace;
