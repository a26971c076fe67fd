//! Unit tests for CLI commands

use crate::cli::{resolve, Cli, Commands};
use crate::dispatcher::{Request, Response};
use crate::router::Router;
use clap::Parser;
use http::Method;

#[test]
fn test_routes_command_parses() {
    let cli = Cli::try_parse_from(["mountrouter", "routes", "--table", "routes.yaml"]).unwrap();

    match cli.command {
        Commands::Routes { table, json } => {
            assert_eq!(table.to_string_lossy(), "routes.yaml");
            assert!(!json);
        }
        _ => panic!("Expected Routes command"),
    }
}

#[test]
fn test_resolve_command_defaults_to_get() {
    let cli = Cli::try_parse_from(["mountrouter", "resolve", "-t", "routes.json", "/users/42"]).unwrap();

    match cli.command {
        Commands::Resolve {
            table,
            method,
            path,
            run,
        } => {
            assert_eq!(table.to_string_lossy(), "routes.json");
            assert_eq!(method, "GET");
            assert_eq!(path, "/users/42");
            assert!(!run);
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_resolve_command_with_flags() {
    let cli = Cli::try_parse_from([
        "mountrouter",
        "resolve",
        "--table",
        "routes.yaml",
        "--method",
        "delete",
        "--run",
        "/admin/x",
    ])
    .unwrap();

    match cli.command {
        Commands::Resolve { method, run, .. } => {
            assert_eq!(method, "delete");
            assert!(run);
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_missing_table_is_rejected() {
    assert!(Cli::try_parse_from(["mountrouter", "routes"]).is_err());
    assert!(Cli::try_parse_from(["mountrouter", "resolve", "/x"]).is_err());
}

fn sample_router() -> Router {
    let mut b = Router::builder();
    b.get("/users/:id", |_: &mut Request| Response::json(200, serde_json::json!({})))
        .unwrap()
        .name("get_user");
    b.build().unwrap()
}

#[test]
fn test_resolve_reports_match() {
    let router = sample_router();
    let out = resolve(&router, &Method::GET, "/users/42");
    assert_eq!(out["status"], "matched");
    assert_eq!(out["name"], "get_user");
    assert_eq!(out["params"]["id"], "42");
}

#[test]
fn test_resolve_reports_failures() {
    let router = sample_router();

    let out = resolve(&router, &Method::POST, "/users/42");
    assert_eq!(out["status"], 405);
    assert_eq!(out["allow"], "GET");

    let out = resolve(&router, &Method::GET, "/nope");
    assert_eq!(out["status"], 404);
    assert!(out["allow"].is_null());
}
