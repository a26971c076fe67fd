//! # mountrouter
//!
//! **mountrouter** is a request-routing and dispatch engine for HTTP-style
//! services: path patterns with parameters and wildcards, prefix-scoped
//! middleware, and child routers mounted under prefixes, resolved by a
//! depth-first walk in registration order.
//!
//! ## Architecture
//!
//! - **[`router`]** - Path tokenizer, routes, middleware entries, mounts, and the
//!   builder that freezes them into an immutable [`Router`]
//! - **[`dispatcher`]** - Resolves (method, path) into a [`MatchResult`] or a
//!   [`DispatchFailure`], and runs matched pipelines
//! - **[`middleware`]** - The [`Middleware`] trait plus auth and tracing middleware
//! - **[`validator`]** - JSON-schema validation of bound path parameters
//! - **[`table`]** - Declarative route tables in YAML or JSON
//! - **[`runtime_config`]** - Router behavior knobs read from the environment
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `mountrouter` binary's commands
//!
//! ### Dispatch Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant T as Transport
//!     participant D as Dispatcher
//!     participant W as dispatch()
//!     participant R as Router tree
//!     participant P as Middleware chain
//!     participant H as Handler
//!
//!     T->>D: handle(Request)
//!     D->>W: dispatch(router, method, path)
//!     W->>R: walk entries in registration order
//!     R-->>W: middleware, route, params
//!     W-->>D: MatchResult / NotFound / MethodNotAllowed
//!     D->>P: Next::run(req)
//!     P->>H: call(req)
//!     H-->>P: Response
//!     P-->>D: Response
//!     D-->>T: Response (404/405 with Allow on failure)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use mountrouter::{Dispatcher, Request, Response, Router};
//! use serde_json::json;
//!
//! let mut users = Router::builder();
//! users
//!     .get("/:id", |req: &mut Request| {
//!         Response::json(200, json!({ "id": req.param("id") }))
//!     })
//!     .unwrap();
//!
//! let mut app = Router::builder();
//! app.mount("/users", users.build().unwrap()).unwrap();
//!
//! let dispatcher = Dispatcher::new(app.build().unwrap());
//! let res = dispatcher.handle(Request::new(Method::GET, "/users/42"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["id"], "42");
//!
//! let res = dispatcher.handle(Request::new(Method::POST, "/users/42"));
//! assert_eq!(res.status, 405);
//! assert_eq!(res.header("allow"), Some("GET"));
//! ```

pub mod cli;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod table;
pub mod validator;

pub use dispatcher::{dispatch, DispatchFailure, Dispatcher, Handler, MatchResult, Next, Request, Response};
pub use middleware::Middleware;
pub use router::{MethodSet, PathPattern, RouteError, Router, RouterBuilder, Segment};
pub use runtime_config::RouterConfig;
pub use table::RouteTable;
