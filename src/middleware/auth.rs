use super::Middleware;
use crate::dispatcher::{Next, Request, Response};

/// Rejects requests whose `authorization` header is not the expected token.
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

impl Middleware for AuthMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Response {
        match req.header("authorization") {
            Some(h) if h == self.token => next.run(req),
            _ => Response::error(401, "Unauthorized"),
        }
    }

    fn name(&self) -> &str {
        "auth"
    }
}
