use std::time::{Duration, Instant};

use tracing::{info, info_span};

use super::Middleware;
use crate::dispatcher::{Next, Request, Response};

/// Opens a span around the rest of the pipeline and logs status and latency.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Response {
        let span = info_span!(
            "request",
            request_id = %req.id,
            method = %req.method,
            path = %req.path,
            route = req.route_name.as_deref().unwrap_or_default(),
        );
        let _guard = span.enter();
        let start = Instant::now();
        let res = next.run(req);
        info!(
            status = res.status,
            latency_us = latency_us(start.elapsed()),
            "Request completed"
        );
        res
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

/// Microseconds, saturating. Dispatch usually finishes well under a millisecond.
fn latency_us(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}
