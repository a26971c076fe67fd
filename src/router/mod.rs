//! # Router Module
//!
//! Route registration, path pattern compilation and the immutable router tree.
//!
//! ## Overview
//!
//! A router is an ordered list of entries, each one of:
//!
//! - **Middleware** - a prefix pattern and a [`Middleware`](crate::middleware::Middleware)
//!   that runs before any route beneath that prefix
//! - **Route** - a method set, a compiled path and a [`Handler`](crate::dispatcher::Handler)
//! - **Mount** - a built child [`Router`] attached under a prefix
//!
//! Registration order is the only precedence rule. There is no "most specific
//! match wins": if `/users/:id` is registered before `/users/new`, a request for
//! `/users/new` reaches the first.
//!
//! ## Build, then serve
//!
//! ```rust
//! use mountrouter::dispatcher::{dispatch, Request, Response};
//! use mountrouter::router::Router;
//! use http::Method;
//!
//! # fn main() -> Result<(), mountrouter::router::RouteError> {
//! let mut users = Router::builder();
//! users
//!     .get("/:id", |req: &mut Request| {
//!         Response::json(200, serde_json::json!({ "id": req.param("id") }))
//!     })?
//!     .name("get_user");
//!
//! let mut api = Router::builder();
//! api.mount("/users", users.build()?)?;
//! let api = api.build()?;
//!
//! let matched = dispatch(&api, &Method::GET, "/users/42").expect("route matches");
//! assert_eq!(matched.param("id"), Some("42"));
//! assert_eq!(api.url_for("get_user", &[("id", "7")]).as_deref(), Some("/users/7"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Patterns
//!
//! See [`PathPattern`] for the syntax: literals, `:name` / `{name}`
//! parameters, a trailing optional `:name?` and a trailing `*` wildcard.

mod core;
mod error;
mod pattern;
mod route;
#[cfg(test)]
mod tests;

pub use self::core::{Entry, MiddlewareEntry, Mount, ParamVec, RouteInfo, Router, RouterBuilder, MAX_INLINE_PARAMS};
pub use error::RouteError;
pub use pattern::{split_path, Constraint, PathPattern, PathSegments, PatternError, Segment, CATCH_ALL};
pub use route::{MethodSet, ParamSchema, Route, RouteRef};
