use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::dispatcher::{dispatch, Dispatcher, Request};
use crate::router::Router;
use crate::runtime_config::RouterConfig;
use crate::table::RouteTable;
use crate::validator::JsonSchemaValidator;

/// Command-line interface for mountrouter
#[derive(Parser)]
#[command(name = "mountrouter")]
#[command(about = "Inspect and exercise mountrouter route tables", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List every reachable route in a route table
    Routes {
        /// Path to the route table (YAML or JSON)
        #[arg(short, long)]
        table: PathBuf,

        /// Print the listing as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Resolve a single request against a route table
    Resolve {
        /// Path to the route table (YAML or JSON)
        #[arg(short, long)]
        table: PathBuf,

        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, optionally with a query string
        path: String,

        /// Run the middleware pipeline and handler and print the response
        #[arg(long, default_value_t = false)]
        run: bool,
    },
}

/// Dispatch `method path` against `router` and describe the outcome as JSON.
pub fn resolve(router: &Router, method: &Method, path: &str) -> Value {
    match dispatch(router, method, path) {
        Ok(m) => json!({
            "status": "matched",
            "route": m.route.describe(),
            "handler": m.route.handler().name(),
            "name": m.route.name(),
            "params": m.params_map(),
            "middleware": m.middleware_names(),
        }),
        Err(failure) => {
            let allowed = failure.allow_header();
            json!({
                "status": failure.status(),
                "error": failure.to_string(),
                "allow": allowed,
            })
        }
    }
}

fn load_router(table: &Path) -> Result<Router> {
    let config = RouterConfig::from_env();
    RouteTable::from_path(table)?
        .build(config)
        .with_context(|| format!("Failed to build router from {}", table.display()))
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Routes { table, json } => {
            let router = load_router(table)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&router.routes())?);
            } else {
                router.dump_routes();
            }
            Ok(())
        }
        Commands::Resolve {
            table,
            method,
            path,
            run,
        } => {
            let router = load_router(table)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid HTTP method '{method}'"))?;
            let output = if *run {
                let dispatcher = Dispatcher::new(router).with_validator(JsonSchemaValidator);
                let response = dispatcher.handle(Request::new(method.clone(), path));
                let headers: serde_json::Map<String, Value> = response
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                    .collect();
                json!({
                    "status": response.status,
                    "headers": headers,
                    "body": response.body,
                })
            } else {
                resolve(&router, &method, path)
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            match output["status"].as_u64() {
                Some(status) if status >= 400 => bail!("{method} {path} failed with status {status}"),
                _ => Ok(()),
            }
        }
    }
}
