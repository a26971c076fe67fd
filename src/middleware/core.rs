use std::fmt;

use crate::dispatcher::{Next, Request, Response};

/// Code that runs before a route's handler.
///
/// Call `next.run(req)` to continue the pipeline; return a response without
/// calling it to end the pipeline there (auth checks, rate limits, ...).
pub trait Middleware: Send + Sync {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Response;

    /// Name used in logs and match diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Adapter for closure middleware, see [`RouterBuilder::use_fn`](crate::router::RouterBuilder::use_fn).
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(&mut Request, Next<'_>) -> Response + Send + Sync,
{
    /// Unnamed adapter; reports itself as `"fn"`.
    pub fn new(f: F) -> Self {
        Self::named("fn", f)
    }

    pub fn named(name: &str, f: F) -> Self {
        Self {
            name: name.to_string(),
            f,
        }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&mut Request, Next<'_>) -> Response + Send + Sync,
{
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Response {
        (self.f)(req, next)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnMiddleware").field(&self.name).finish()
    }
}
