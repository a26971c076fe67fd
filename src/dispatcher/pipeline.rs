//! Execution pipeline: request context, response, handler and `Next`.
//!
//! A matched [`MatchResult`](super::MatchResult) becomes a chain of
//! middleware calls ending in the route's handler. Each middleware receives
//! the request context explicitly and a [`Next`] it may run to continue;
//! returning without running it ends the pipeline.

use http::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::RequestId;
use crate::router::{MiddlewareEntry, ParamVec};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for requests and responses.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Terminal request handler bound to a route.
pub trait Handler: Send + Sync {
    fn call(&self, req: &mut Request) -> Response;

    /// Name used in logs and route listings.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Handler for F
where
    F: Fn(&mut Request) -> Response + Send + Sync,
{
    fn call(&self, req: &mut Request) -> Response {
        (self)(req)
    }
}

/// Request context threaded through the middleware chain.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub id: RequestId,
    pub method: Method,
    /// Request path as received, query string included
    pub path: String,
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Parameters bound by the match; empty until dispatched
    pub params: ParamVec,
    /// Name of the matched route, if it has one
    pub route_name: Option<Arc<str>>,
    /// Per-request values set by middleware for later pipeline stages
    pub state: Map<String, Value>,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            id: RequestId::new(),
            method,
            path: path.to_string(),
            headers: HeaderVec::new(),
            body: None,
            params: ParamVec::new(),
            route_name: None,
            state: Map::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Get a bound parameter ("last write wins", see [`super::MatchResult::param`]).
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert params to a HashMap. Allocates; use [`param`](Self::param) on hot paths.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Response produced by a handler or a short-circuiting middleware.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    pub body: Value,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with a `content-type` header.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// The rest of the pipeline after the current middleware.
///
/// Consumed by [`run`](Self::run), so a middleware can continue at most once.
pub struct Next<'a> {
    chain: &'a [&'a MiddlewareEntry],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [&'a MiddlewareEntry], handler: &'a dyn Handler) -> Self {
        Self { chain, handler }
    }

    /// Number of middleware still to run before the handler.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Continue with the next middleware, or the handler if none are left.
    pub fn run(self, req: &mut Request) -> Response {
        match self.chain.split_first() {
            Some((entry, rest)) => entry.middleware().handle(req, Next::new(rest, self.handler)),
            None => self.handler.call(req),
        }
    }
}
