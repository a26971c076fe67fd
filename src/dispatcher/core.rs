//! Dispatcher core: resolve (method, path) against a built router tree.
//!
//! The walk is depth-first over each router's entries in registration order.
//! Matched middleware accumulate as the walk proceeds; the first route whose
//! path *and* method match ends it. Not-found and method-not-allowed are
//! ordinary return values, never panics.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::router::{split_path, Entry, MiddlewareEntry, ParamVec, Route, Router};

/// Most pipelines have a handful of middleware at most.
pub const MAX_INLINE_MIDDLEWARE: usize = 8;

/// Matched middleware, outermost first.
pub type MiddlewareVec<'r> = SmallVec<[&'r MiddlewareEntry; MAX_INLINE_MIDDLEWARE]>;

/// A successful dispatch: the execution pipeline for one request.
///
/// Borrows from the router it was produced from, so no routes or middleware
/// are cloned per request.
#[derive(Debug, Clone)]
pub struct MatchResult<'r> {
    /// Middleware to run, in registration order, ancestors' before the
    /// mounted child's.
    pub middlewares: MiddlewareVec<'r>,
    /// The terminal route.
    pub route: &'r Route,
    /// Raw parameter values bound by mount prefixes and the route path.
    pub params: ParamVec,
    /// Index in `params` where the terminal route's own bindings start.
    route_start: usize,
}

impl MatchResult<'_> {
    /// Look up a bound parameter.
    ///
    /// Uses "last write wins" semantics: if a mount prefix and the route inside
    /// it both bind `id`, the innermost (route) value is returned.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Bindings made by the terminal route's pattern, excluding mount prefixes.
    #[must_use]
    pub fn route_params(&self) -> &[(Arc<str>, String)] {
        &self.params[self.route_start..]
    }

    /// Convert params to a HashMap. Allocates; use [`param`](Self::param) on hot paths.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Names of the matched middleware, outermost first.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }
}

/// Why a request could not be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// No entry at any depth matches the path.
    NotFound,
    /// At least one route matches the path but none accepts the method.
    MethodNotAllowed {
        /// Union of the methods the matching routes accept, in the order
        /// they were first observed.
        allowed: Vec<Method>,
    },
}

impl DispatchFailure {
    /// HTTP status the transport should answer with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchFailure::NotFound => 404,
            DispatchFailure::MethodNotAllowed { .. } => 405,
        }
    }

    /// Value for an `Allow` response header, for 405 responses.
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        match self {
            DispatchFailure::NotFound => None,
            DispatchFailure::MethodNotAllowed { allowed } => Some(
                allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::NotFound => f.write_str("not found"),
            DispatchFailure::MethodNotAllowed { .. } => write!(
                f,
                "method not allowed (allowed: {})",
                self.allow_header().unwrap_or_default()
            ),
        }
    }
}

/// Resolve `method` + `path` against `router`.
///
/// `path` may carry a query string or fragment; both are ignored. Path
/// segments are percent-decoded when the router's config enables it.
/// Pure function of its inputs: safe to call from any number of threads on a
/// shared `Router`.
pub fn dispatch<'r>(
    router: &'r Router,
    method: &Method,
    path: &str,
) -> Result<MatchResult<'r>, DispatchFailure> {
    let start = Instant::now();
    let segments = split_path(path, router.config().decode_percent);

    let mut walk = Walk {
        method,
        middlewares: MiddlewareVec::new(),
        params: ParamVec::new(),
        route_start: 0,
        allowed: Vec::new(),
    };
    let matched = walk.router(router, &segments);
    let elapsed = start.elapsed();

    if elapsed > router.config().slow_match_threshold {
        warn!(
            method = %method,
            path = %path,
            duration_us = elapsed.as_micros(),
            "Slow route matching detected"
        );
    }

    match matched {
        Some(route) => {
            debug!(
                method = %method,
                path = %path,
                route = %route.pattern(),
                route_name = route.name().unwrap_or_default(),
                handler = route.handler().name(),
                middleware_count = walk.middlewares.len(),
                params = ?walk.params,
                duration_us = elapsed.as_micros(),
                "Route matched"
            );
            Ok(MatchResult {
                middlewares: walk.middlewares,
                route,
                params: walk.params,
                route_start: walk.route_start,
            })
        }
        None if walk.allowed.is_empty() => {
            debug!(method = %method, path = %path, "No route matched");
            Err(DispatchFailure::NotFound)
        }
        None => {
            debug!(
                method = %method,
                path = %path,
                allowed = ?walk.allowed,
                "Path matched but method not allowed"
            );
            Err(DispatchFailure::MethodNotAllowed {
                allowed: walk.allowed,
            })
        }
    }
}

/// Accumulated state of one dispatch.
struct Walk<'m, 'r> {
    method: &'m Method,
    middlewares: MiddlewareVec<'r>,
    params: ParamVec,
    route_start: usize,
    /// 405 candidates seen so far, at any depth.
    allowed: Vec<Method>,
}

impl<'r> Walk<'_, 'r> {
    fn router(&mut self, router: &'r Router, path: &[std::borrow::Cow<'_, str>]) -> Option<&'r Route> {
        for entry in router.entries() {
            match entry {
                Entry::Middleware(mw) => {
                    // Middleware bindings are not part of the route's params.
                    let mark = self.params.len();
                    if mw.prefix.matches(path, &mut self.params) {
                        self.middlewares.push(mw);
                    }
                    self.params.truncate(mark);
                }
                Entry::Route(route) => {
                    let mark = self.params.len();
                    if !route.pattern.matches(path, &mut self.params) {
                        continue;
                    }
                    if route.methods.contains(self.method) {
                        self.route_start = mark;
                        return Some(route);
                    }
                    self.params.truncate(mark);
                    for m in route.methods.methods() {
                        if !self.allowed.contains(m) {
                            self.allowed.push(m.clone());
                        }
                    }
                }
                Entry::Mount(mount) => {
                    let param_mark = self.params.len();
                    let Some(consumed) = mount.prefix.match_prefix(path, &mut self.params) else {
                        continue;
                    };
                    let mw_mark = self.middlewares.len();
                    if let Some(route) = self.router(&mount.router, &path[consumed..]) {
                        return Some(route);
                    }
                    // Nothing in the child matched; its middleware and
                    // bindings must not leak into later siblings.
                    self.middlewares.truncate(mw_mark);
                    self.params.truncate(param_mark);
                }
            }
        }
        None
    }
}
