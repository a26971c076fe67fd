//! Middleware: code that runs before a route handler and may end the
//! pipeline early. Register with [`RouterBuilder::use_middleware`](crate::router::RouterBuilder::use_middleware)
//! or scope it to a prefix with `use_middleware_at`.

mod auth;
mod core;
mod tracing;

pub use auth::AuthMiddleware;
pub use self::core::{FnMiddleware, Middleware};
pub use self::tracing::TracingMiddleware;
