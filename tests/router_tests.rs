use http::Method;
use mountrouter::dispatcher::{Handler, Request, Response};
use mountrouter::router::{MethodSet, RouteError, Router};
use serde_json::json;
use std::sync::Arc;

mod common;
use common::tagged;

struct Named(&'static str);

impl Handler for Named {
    fn call(&self, _req: &mut Request) -> Response {
        Response::json(200, json!({ "handler": self.0 }))
    }

    fn name(&self) -> &str {
        self.0
    }
}

fn api() -> Router {
    let mut users = Router::builder();
    users.get("/", Named("list_users")).unwrap().name("list_users");
    users.get("/:id", Named("get_user")).unwrap().name("get_user");
    users
        .route(&[Method::PUT, Method::PATCH], "/:id", Named("update_user"))
        .unwrap();

    let mut files = Router::builder();
    files.get("/*", Named("files")).unwrap().name("file");

    let mut b = Router::builder();
    b.use_fn(common::mark("root"));
    b.mount("/orgs/:org/users", users.build().unwrap()).unwrap();
    b.mount("/files/", files.build().unwrap()).unwrap();
    b.all("/health", Named("health")).unwrap();
    b.build().unwrap()
}

#[test]
fn test_routes_are_flattened_in_dispatch_order() {
    let routes = api().routes();
    let listed: Vec<(&str, &str, &str)> = routes
        .iter()
        .map(|r| (r.methods.as_str(), r.path.as_str(), r.handler.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("GET", "/orgs/:org/users", "list_users"),
            ("GET", "/orgs/:org/users/:id", "get_user"),
            ("PUT,PATCH", "/orgs/:org/users/:id", "update_user"),
            ("GET", "/files/*", "files"),
            ("ALL", "/health", "health"),
        ]
    );
    assert_eq!(routes[1].name.as_deref(), Some("get_user"));
}

#[test]
fn test_url_for_includes_mount_prefixes() {
    let router = api();
    assert_eq!(
        router.url_for("get_user", &[("org", "acme"), ("id", "42")]).as_deref(),
        Some("/orgs/acme/users/42")
    );
    assert_eq!(
        router.url_for("list_users", &[("org", "a b")]).as_deref(),
        Some("/orgs/a%20b/users")
    );
    assert_eq!(
        router.url_for("file", &[("*", "css/site.css")]).as_deref(),
        Some("/files/css/site.css")
    );
    assert_eq!(router.url_for("get_user", &[("id", "42")]), None);
    assert_eq!(router.url_for("nope", &[]), None);
}

#[test]
fn test_entries_keep_registration_order() {
    let router = api();
    let kinds: Vec<&str> = router
        .entries()
        .iter()
        .map(|e| match e {
            mountrouter::router::Entry::Middleware(_) => "middleware",
            mountrouter::router::Entry::Route(_) => "route",
            mountrouter::router::Entry::Mount(_) => "mount",
        })
        .collect();
    assert_eq!(kinds, vec!["middleware", "mount", "mount", "route"]);
}

#[test]
fn test_mount_prefix_gets_trailing_wildcard() {
    let router = api();
    let prefixes: Vec<String> = router
        .entries()
        .iter()
        .filter_map(|e| match e {
            mountrouter::router::Entry::Mount(m) => Some(m.prefix().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(prefixes, vec!["/orgs/:org/users/*", "/files/*"]);
}

#[test]
fn test_invalid_prefixes_rejected() {
    let child = Router::builder().build().unwrap();
    let mut b = Router::builder();
    assert!(matches!(b.mount("/a/*/b", child.clone()), Err(RouteError::Pattern(_))));
    assert!(matches!(b.mount("/a/:opt?", child), Err(RouteError::Pattern(_))));
    assert!(b
        .use_fn_at("/x/{", common::mark("bad"))
        .is_err());
}

#[test]
fn test_route_shared_reuses_handler() {
    let shared: Arc<dyn Handler> = Arc::new(Named("shared"));
    let mut b = Router::builder();
    b.route_shared(MethodSet::All, "/a", shared.clone()).unwrap();
    b.route_shared(MethodSet::All, "/b", shared).unwrap();
    let router = b.build().unwrap();
    assert!(router.routes().iter().all(|r| r.handler == "shared"));
}

#[test]
fn test_routes_serialize_to_json() {
    let mut b = Router::builder();
    b.get("/x", tagged("x")).unwrap().name("x");
    let router = b.build().unwrap();
    let value = serde_json::to_value(router.routes()).unwrap();
    assert_eq!(value[0]["path"], "/x");
    assert_eq!(value[0]["methods"], "GET");
    assert_eq!(value[0]["name"], "x");
}

#[test]
fn test_empty_router_builds() {
    let router = Router::builder().build().unwrap();
    assert!(router.routes().is_empty());
    assert!(router.entries().is_empty());
}
