//! # Dispatcher Module
//!
//! Resolves an incoming (method, path) pair against a built
//! [`Router`](crate::router::Router) and executes the resulting pipeline.
//!
//! ## Overview
//!
//! - [`dispatch`] walks the router tree and returns a [`MatchResult`]
//!   (ordered middleware, terminal route, parameter bag) or a
//!   [`DispatchFailure`] (`NotFound` / `MethodNotAllowed`).
//! - [`Next`] runs a matched pipeline: each middleware gets the request and
//!   decides whether to continue.
//! - [`Dispatcher`] ties both together for a transport layer: it answers
//!   routing failures with 404/405, runs parameter validation, and catches
//!   panics.
//!
//! ## Request Flow
//!
//! 1. Split the path into percent-decoded segments (query string dropped)
//! 2. Walk entries in registration order, recursing into matching mounts
//! 3. Collect every middleware whose prefix matches on the way
//! 4. Stop at the first route whose path and method both match
//! 5. Run the middleware chain, then the route handler
//!
//! ## Concurrency
//!
//! `dispatch` is a pure function of (router, method, path). A built `Router`
//! is immutable, so any number of threads may dispatch against it at once.

mod core;
mod pipeline;
mod service;

pub use self::core::{dispatch, DispatchFailure, MatchResult, MiddlewareVec, MAX_INLINE_MIDDLEWARE};
pub use pipeline::{Handler, HeaderVec, Next, Request, Response, MAX_INLINE_HEADERS};
pub use service::Dispatcher;
