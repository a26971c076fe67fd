//! # Route Table Module
//!
//! Declarative route tables in YAML or JSON, used by the CLI and by tests to
//! describe a router tree without writing Rust. Handlers in a table are
//! named echo handlers: they answer with their name and the bound parameters.
//!
//! ```yaml
//! entries:
//!   - kind: middleware
//!     middleware: tracing
//!   - kind: route
//!     methods: [GET]
//!     path: /users/:id
//!     handler: get_user
//!     name: get_user
//!     constraints: { id: '\d+' }
//!     params:
//!       id: { type: integer, minimum: 1 }
//!   - kind: mount
//!     prefix: /admin
//!     entries:
//!       - kind: middleware
//!         middleware: auth
//!         token: secret
//!       - kind: route
//!         methods: [ALL]
//!         path: /*
//!         handler: admin_fallback
//! ```
//!
//! Entries are registered in file order, which is also dispatch precedence.

use anyhow::{anyhow, bail, Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::dispatcher::{Handler, Next, Request, Response};
use crate::middleware::{AuthMiddleware, Middleware, TracingMiddleware};
use crate::router::{MethodSet, Router, RouterBuilder};
use crate::runtime_config::RouterConfig;

/// State key under which marker middleware record that they ran.
pub const MIDDLEWARE_TRAIL: &str = "middleware";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteTable {
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntrySpec {
    Middleware(MiddlewareSpec),
    Route(RouteSpec),
    Mount(MountSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareSpec {
    /// Defaults to every path.
    #[serde(default)]
    pub prefix: Option<String>,
    /// `tracing`, `auth`, or any other name for a marker middleware.
    pub middleware: String,
    /// Expected `authorization` header for `auth`.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// HTTP methods, or `[ALL]`.
    pub methods: Vec<String>,
    pub path: String,
    pub handler: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    /// JSON schema per path parameter.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountSpec {
    pub prefix: String,
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

impl RouteTable {
    /// Load a table, choosing YAML or JSON by file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route table {}", path.display()))?;
        let table = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML route table {}", path.display()))?,
            _ => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON route table {}", path.display()))?,
        };
        Ok(table)
    }

    /// Build the router tree described by this table.
    pub fn build(&self, config: RouterConfig) -> Result<Router> {
        let router = build_entries(&self.entries, config, "")?;
        info!(routes = router.routes().len(), "Route table built");
        Ok(router)
    }
}

fn build_entries(entries: &[EntrySpec], config: RouterConfig, at: &str) -> Result<Router> {
    let mut builder = RouterBuilder::with_config(config);
    for (i, entry) in entries.iter().enumerate() {
        let position = format!("{at}entries[{i}]");
        match entry {
            EntrySpec::Middleware(spec) => add_middleware(&mut builder, spec)
                .with_context(|| format!("{position}: middleware '{}'", spec.middleware))?,
            EntrySpec::Route(spec) => add_route(&mut builder, spec)
                .with_context(|| format!("{position}: route '{}'", spec.path))?,
            EntrySpec::Mount(spec) => {
                let child = build_entries(&spec.entries, config, &format!("{position}."))?;
                builder
                    .mount(&spec.prefix, child)
                    .with_context(|| format!("{position}: mount '{}'", spec.prefix))?;
            }
        }
    }
    builder
        .build()
        .with_context(|| format!("Failed to build router at '{}'", if at.is_empty() { "root" } else { at }))
}

fn add_middleware(builder: &mut RouterBuilder, spec: &MiddlewareSpec) -> Result<()> {
    let middleware: Arc<dyn Middleware> = match spec.middleware.as_str() {
        "tracing" => Arc::new(TracingMiddleware),
        "auth" => {
            let token = spec
                .token
                .clone()
                .ok_or_else(|| anyhow!("auth middleware requires a token"))?;
            Arc::new(AuthMiddleware::new(token))
        }
        name => Arc::new(MarkerMiddleware::new(name)),
    };
    builder.use_shared_at(spec.prefix.as_deref().unwrap_or("/*"), middleware)?;
    Ok(())
}

fn add_route(builder: &mut RouterBuilder, spec: &RouteSpec) -> Result<()> {
    let methods = parse_methods(&spec.methods)?;
    let handler = Arc::new(EchoHandler::new(&spec.handler));
    let mut route = builder.route_shared(methods, &spec.path, handler)?;
    if let Some(name) = &spec.name {
        route = route.name(name);
    }
    for (param, regex) in &spec.constraints {
        route = route.constraint(param, regex)?;
    }
    for (param, schema) in &spec.params {
        route = route.param_schema(param, schema.clone())?;
    }
    Ok(())
}

fn parse_methods(methods: &[String]) -> Result<MethodSet> {
    if methods.iter().any(|m| m.eq_ignore_ascii_case("ALL") || m == "*") {
        return Ok(MethodSet::All);
    }
    let parsed = methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| anyhow!("invalid HTTP method '{m}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    match MethodSet::only(&parsed) {
        Some(set) => Ok(set),
        None => bail!("route declares no methods"),
    }
}

/// Handler that answers with its own name and the bound parameters.
#[derive(Debug, Clone)]
pub struct EchoHandler {
    name: String,
}

impl EchoHandler {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Handler for EchoHandler {
    fn call(&self, req: &mut Request) -> Response {
        Response::json(
            200,
            json!({
                "handler": self.name,
                "method": req.method.as_str(),
                "path": req.path,
                "params": req.params_map(),
                "middleware": req.state.get(MIDDLEWARE_TRAIL).cloned().unwrap_or_else(|| json!([])),
            }),
        )
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Middleware that only records its name in the request state.
#[derive(Debug, Clone)]
pub struct MarkerMiddleware {
    name: String,
}

impl MarkerMiddleware {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Middleware for MarkerMiddleware {
    fn handle(&self, req: &mut Request, next: Next<'_>) -> Response {
        match req
            .state
            .entry(MIDDLEWARE_TRAIL)
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(trail) => trail.push(Value::String(self.name.clone())),
            other => *other = json!([self.name]),
        }
        next.run(req)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
