use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::core::dispatch;
use super::pipeline::{Next, Request, Response};
use crate::ids::RequestId;
use crate::router::Router;
use crate::validator::ParamValidator;

/// Front door for a built router: dispatch, validate, run the pipeline.
///
/// Translates routing failures into 404/405 responses (with an `Allow`
/// header), parameter validation failures into 400, and handler or
/// middleware panics into 500.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
    validator: Option<Arc<dyn ParamValidator>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router,
            validator: None,
        }
    }

    /// Validate bound parameters before the pipeline runs.
    #[must_use]
    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: ParamValidator + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Route and execute one request.
    ///
    /// A valid `x-request-id` header is adopted as the request ID and echoed
    /// on the response.
    pub fn handle(&self, mut req: Request) -> Response {
        let start = Instant::now();
        if let Some(id) = req
            .header("x-request-id")
            .and_then(|h| h.parse::<RequestId>().ok())
        {
            req.id = id;
        }
        let mut res = self.route(&mut req);
        res.set_header("x-request-id", req.id.to_string());
        info!(
            request_id = %req.id,
            method = %req.method,
            path = %req.path,
            route = req.route_name.as_deref().unwrap_or_default(),
            status = res.status,
            latency_us = start.elapsed().as_micros(),
            "Request handled"
        );
        res
    }

    fn route(&self, req: &mut Request) -> Response {
        let matched = match dispatch(&self.router, &req.method, &req.path) {
            Ok(matched) => matched,
            Err(failure) => {
                info!(
                    request_id = %req.id,
                    method = %req.method,
                    path = %req.path,
                    status = failure.status(),
                    "Request not routed"
                );
                let mut res = Response::error(failure.status(), &failure.to_string());
                if let Some(allow) = failure.allow_header() {
                    res.set_header("allow", allow);
                }
                return res;
            }
        };

        req.params = matched.params.clone();
        req.route_name = matched.route.name.clone();

        if let Some(validator) = &self.validator {
            if let Err(err) = validator.validate(matched.route, matched.route_params()) {
                warn!(
                    request_id = %req.id,
                    route = %matched.route.describe(),
                    param = %err.param,
                    error = %err.message,
                    "Parameter validation failed"
                );
                return Response::json(
                    400,
                    serde_json::json!({
                        "error": "invalid parameter",
                        "param": err.param,
                        "message": err.message,
                    }),
                );
            }
        }

        let next = Next::new(&matched.middlewares, matched.route.handler.as_ref());
        let outcome = catch_unwind(AssertUnwindSafe(|| next.run(req)));
        match outcome {
            Ok(res) => res,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    request_id = %req.id,
                    route = %matched.route.describe(),
                    panic = %message,
                    "Handler panicked"
                );
                Response::error(500, "internal server error")
            }
        }
    }
}
