//! Router core: registration, freezing and tree introspection.
//!
//! A [`RouterBuilder`] collects entries in registration order. [`RouterBuilder::build`]
//! consumes it and returns a [`Router`], an immutable, cheaply clonable tree that
//! the dispatcher walks for every request. There is no way to register into a
//! built `Router`, so the tree can be shared by any number of threads.

use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::RouteError;
use super::pattern::{PathPattern, Segment};
use super::route::{MethodSet, Route, RouteRef};
use crate::dispatcher::{Handler, Next, Request, Response};
use crate::middleware::{FnMiddleware, Middleware};
use crate::runtime_config::RouterConfig;

/// Maximum number of bound parameters before heap allocation.
/// Most routes bind ≤4 (e.g. `/orgs/:org/users/:id`), mounts included.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter bag produced by a match: name → raw (uncoerced) value, in
/// binding order. Names are shared with the compiled pattern.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered (prefix, middleware) binding.
#[derive(Clone)]
pub struct MiddlewareEntry {
    pub(crate) prefix: PathPattern,
    pub(crate) middleware: Arc<dyn Middleware>,
}

impl MiddlewareEntry {
    #[must_use]
    pub fn prefix(&self) -> &PathPattern {
        &self.prefix
    }

    #[must_use]
    pub fn middleware(&self) -> &dyn Middleware {
        self.middleware.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.middleware.name()
    }
}

impl fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("prefix", &self.prefix.to_string())
            .field("middleware", &self.middleware.name())
            .finish()
    }
}

/// A child router attached under a wildcard-terminated prefix.
///
/// The child is shared, not copied: mounting the same `Router` twice
/// references one tree.
#[derive(Clone, Debug)]
pub struct Mount {
    pub(crate) prefix: PathPattern,
    pub(crate) router: Router,
}

impl Mount {
    #[must_use]
    pub fn prefix(&self) -> &PathPattern {
        &self.prefix
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// One entry of a router, in registration order.
#[derive(Clone, Debug)]
pub enum Entry {
    Middleware(MiddlewareEntry),
    Route(Route),
    Mount(Mount),
}

/// One reachable route, flattened with its mount prefixes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RouteInfo {
    pub methods: String,
    pub path: String,
    pub name: Option<String>,
    pub handler: String,
}

/// Mutable registration surface. Call [`build`](Self::build) to freeze it.
///
/// | Registration            | Method                                         |
/// |-------------------------|------------------------------------------------|
/// | `use(fn)`               | [`use_fn`](Self::use_fn), [`use_middleware`](Self::use_middleware) |
/// | `use(prefix, fn)`       | [`use_fn_at`](Self::use_fn_at), [`use_middleware_at`](Self::use_middleware_at) |
/// | `use(prefix, router)`   | [`mount`](Self::mount)                         |
/// | `get`/`post`/… `all`    | verb registrars, [`route`](Self::route)        |
#[derive(Default)]
pub struct RouterBuilder {
    entries: Vec<Entry>,
    /// Most recent route, still open to [`RouteRef`] settings. Moved into
    /// `entries` by the next registration or by `build`.
    pending: Option<Route>,
    config: RouterConfig,
}

impl RouterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            entries: Vec::new(),
            pending: None,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn compile(&self, pattern: &str) -> Result<PathPattern, RouteError> {
        Ok(PathPattern::parse_with(pattern, self.config.decode_percent)?)
    }

    fn flush_pending(&mut self) {
        if let Some(route) = self.pending.take() {
            self.entries.push(Entry::Route(route));
        }
    }

    fn push_entry(&mut self, entry: Entry) {
        self.flush_pending();
        self.entries.push(entry);
    }

    /// Run `middleware` for every path.
    pub fn use_middleware<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware + 'static,
    {
        let prefix = PathPattern::from_segments("/*", vec![Segment::Wildcard]);
        self.push_entry(Entry::Middleware(MiddlewareEntry {
            prefix,
            middleware: Arc::new(middleware),
        }));
        self
    }

    /// Run `middleware` for `prefix` and every path beneath it.
    pub fn use_middleware_at<M>(&mut self, prefix: &str, middleware: M) -> Result<&mut Self, RouteError>
    where
        M: Middleware + 'static,
    {
        self.push_middleware(prefix, Arc::new(middleware))
    }

    /// Shared-instance variant of [`use_middleware_at`](Self::use_middleware_at).
    pub fn use_shared_at(&mut self, prefix: &str, middleware: Arc<dyn Middleware>) -> Result<&mut Self, RouteError> {
        self.push_middleware(prefix, middleware)
    }

    /// Closure middleware for every path.
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Request, Next<'_>) -> Response + Send + Sync + 'static,
    {
        self.use_middleware(FnMiddleware::new(f))
    }

    /// Closure middleware for `prefix` and every path beneath it.
    pub fn use_fn_at<F>(&mut self, prefix: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Request, Next<'_>) -> Response + Send + Sync + 'static,
    {
        self.push_middleware(prefix, Arc::new(FnMiddleware::new(f)))
    }

    /// Closure middleware for every path, reported under `name` in logs
    /// and [`MatchResult::middleware_names`](crate::dispatcher::MatchResult::middleware_names).
    pub fn use_fn_named<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut Request, Next<'_>) -> Response + Send + Sync + 'static,
    {
        self.use_middleware(FnMiddleware::named(name, f))
    }

    /// Named closure middleware for `prefix` and every path beneath it.
    pub fn use_fn_named_at<F>(&mut self, prefix: &str, name: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Request, Next<'_>) -> Response + Send + Sync + 'static,
    {
        self.push_middleware(prefix, Arc::new(FnMiddleware::named(name, f)))
    }

    fn push_middleware(&mut self, prefix: &str, middleware: Arc<dyn Middleware>) -> Result<&mut Self, RouteError> {
        let prefix = self.compile(prefix)?.into_prefix()?;
        debug!(prefix = %prefix, middleware = middleware.name(), "Middleware registered");
        self.push_entry(Entry::Middleware(MiddlewareEntry { prefix, middleware }));
        Ok(self)
    }

    /// Mount a built child router under `prefix`. A trailing `/*` is
    /// appended to the prefix if missing.
    ///
    /// Request paths are split once, with this router's decoding setting, so
    /// the child must have been built with the same `decode_percent`.
    pub fn mount(&mut self, prefix: &str, router: Router) -> Result<&mut Self, RouteError> {
        if router.config.decode_percent != self.config.decode_percent {
            return Err(RouteError::DecodeMismatch {
                prefix: prefix.to_string(),
                parent: self.config.decode_percent,
                child: router.config.decode_percent,
            });
        }
        let prefix = self.compile(prefix)?.into_prefix()?;
        debug!(prefix = %prefix, child_entries = router.entries.len(), "Router mounted");
        self.push_entry(Entry::Mount(Mount { prefix, router }));
        Ok(self)
    }

    /// Register `handler` for an explicit list of methods.
    pub fn route<H>(&mut self, methods: &[Method], path: &str, handler: H) -> Result<RouteRef<'_>, RouteError>
    where
        H: Handler + 'static,
    {
        let methods = MethodSet::only(methods).ok_or_else(|| RouteError::EmptyMethodSet {
            path: path.to_string(),
        })?;
        self.push_route(methods, path, Arc::new(handler))
    }

    /// Register a shared handler instance.
    pub fn route_shared(&mut self, methods: MethodSet, path: &str, handler: Arc<dyn Handler>) -> Result<RouteRef<'_>, RouteError> {
        if let MethodSet::Only(m) = &methods {
            if m.is_empty() {
                return Err(RouteError::EmptyMethodSet {
                    path: path.to_string(),
                });
            }
        }
        self.push_route(methods, path, handler)
    }

    pub fn get<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::GET], path, handler)
    }

    pub fn post<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::POST], path, handler)
    }

    pub fn put<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::PUT], path, handler)
    }

    pub fn patch<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::PATCH], path, handler)
    }

    pub fn delete<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::DELETE], path, handler)
    }

    pub fn head<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::HEAD], path, handler)
    }

    pub fn options<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.route(&[Method::OPTIONS], path, handler)
    }

    /// Register `handler` for every method.
    pub fn all<H: Handler + 'static>(&mut self, path: &str, handler: H) -> Result<RouteRef<'_>, RouteError> {
        self.push_route(MethodSet::All, path, Arc::new(handler))
    }

    fn push_route(&mut self, methods: MethodSet, path: &str, handler: Arc<dyn Handler>) -> Result<RouteRef<'_>, RouteError> {
        let pattern = self.compile(path)?;
        debug!(methods = %methods, path = %pattern, handler = handler.name(), "Route registered");
        self.flush_pending();
        let route = self.pending.insert(Route::new(methods, pattern, handler));
        Ok(RouteRef::new(route))
    }

    /// Freeze the builder into an immutable [`Router`].
    ///
    /// Fails with [`RouteError::DuplicateRoute`] when a route can never be
    /// reached because an earlier route in the same router accepts the same
    /// method on a path of identical shape, unless
    /// [`RouterConfig::allow_shadowed_routes`] is set, in which case the
    /// conflict is logged and the first registration wins.
    pub fn build(mut self) -> Result<Router, RouteError> {
        self.flush_pending();
        let routes: Vec<&Route> = self
            .entries
            .iter()
            .filter_map(|e| match e {
                Entry::Route(r) => Some(r),
                _ => None,
            })
            .collect();

        for (i, later) in routes.iter().enumerate() {
            let shadowing = routes[..i].iter().find_map(|earlier| {
                if !earlier.pattern.same_shape(&later.pattern) {
                    return None;
                }
                earlier
                    .methods
                    .overlap(&later.methods)
                    .map(|method| (method, earlier))
            });
            if let Some((method, earlier)) = shadowing {
                if self.config.allow_shadowed_routes {
                    warn!(
                        method = %method,
                        route = %later.describe(),
                        shadowed_by = %earlier.describe(),
                        "Shadowed route registered; first registration wins"
                    );
                } else {
                    return Err(RouteError::DuplicateRoute {
                        method,
                        path: later.pattern.to_string(),
                        shadowed_by: earlier.describe(),
                    });
                }
            }
        }

        let router = Router {
            entries: Arc::from(self.entries),
            config: self.config,
        };
        info!(
            entries = router.entries.len(),
            routes = router.routes().len(),
            decode_percent = router.config.decode_percent,
            "Router built"
        );
        Ok(router)
    }
}

/// Immutable, built router tree.
///
/// Cloning is an `Arc` increment. Dispatch with [`crate::dispatcher::dispatch`].
#[derive(Clone)]
pub struct Router {
    entries: Arc<[Entry]>,
    config: RouterConfig,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("entries", &self.entries)
            .finish()
    }
}

impl Router {
    /// Start building a router.
    #[must_use]
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Every route reachable through this tree, with mount prefixes applied,
    /// in dispatch order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        let mut out = Vec::new();
        self.collect_routes("", &mut out);
        out
    }

    fn collect_routes(&self, base: &str, out: &mut Vec<RouteInfo>) {
        for entry in self.entries.iter() {
            match entry {
                Entry::Route(route) => out.push(RouteInfo {
                    methods: route.methods.to_string(),
                    path: join_paths(base, &route.pattern.to_string()),
                    name: route.name.as_deref().map(str::to_string),
                    handler: route.handler.name().to_string(),
                }),
                Entry::Mount(mount) => {
                    let prefix = mount_prefix_display(&mount.prefix);
                    mount
                        .router
                        .collect_routes(&join_paths(base, &prefix), out);
                }
                Entry::Middleware(_) => {}
            }
        }
    }

    /// Print the flattened route table to stdout.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        println!("[routes] count={}", routes.len());
        for r in routes {
            match r.name {
                Some(name) => println!("[route] {} {} -> {} ({name})", r.methods, r.path, r.handler),
                None => println!("[route] {} {} -> {}", r.methods, r.path, r.handler),
            }
        }
    }

    /// Reverse lookup: render the full path (mount prefixes included) of the
    /// first route named `name`.
    ///
    /// Returns `None` if no route has that name or a required parameter is
    /// missing from `params`.
    #[must_use]
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        let lookup = |key: &str| params.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        for entry in self.entries.iter() {
            match entry {
                Entry::Route(route) if route.name.as_deref() == Some(name) => {
                    return route.pattern.render(lookup);
                }
                Entry::Mount(mount) => {
                    if let Some(rest) = mount.router.url_for(name, params) {
                        let prefix = PathPattern::from_segments(
                            mount.prefix.source(),
                            mount.prefix.fixed_segments().to_vec(),
                        )
                        .render(lookup)?;
                        return Some(join_paths(&prefix, &rest));
                    }
                }
                _ => {}
            }
        }
        None
    }
}

fn mount_prefix_display(prefix: &PathPattern) -> String {
    let shown = prefix.to_string();
    match shown.strip_suffix("/*") {
        Some(head) => head.to_string(),
        None => shown,
    }
}

fn join_paths(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    match (base.is_empty(), rest) {
        (true, "") => "/".to_string(),
        (true, _) => rest.to_string(),
        (false, "" | "/") => base.to_string(),
        (false, _) => format!("{base}{rest}"),
    }
}
