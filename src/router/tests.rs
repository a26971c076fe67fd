use super::*;
use crate::dispatcher::{Request, Response};
use http::Method;
use serde_json::json;
use std::borrow::Cow;

fn ok(_: &mut Request) -> Response {
    Response::json(200, json!({}))
}

fn segs(path: &str) -> Vec<Cow<'_, str>> {
    split_path(path, true).into_vec()
}

#[test]
fn test_tokenize_literal_param_literal() {
    let p = PathPattern::parse("/foo/:id/bar").unwrap();
    assert_eq!(
        p.segments(),
        &[Segment::literal("foo"), Segment::param("id"), Segment::literal("bar")]
    );
}

#[test]
fn test_tokenize_brace_param() {
    let p = PathPattern::parse("/items/{id}").unwrap();
    assert_eq!(p.segments(), &[Segment::literal("items"), Segment::param("id")]);
}

#[test]
fn test_tokenize_trailing_wildcard() {
    let p = PathPattern::parse("/foo/*").unwrap();
    assert_eq!(p.segments(), &[Segment::literal("foo"), Segment::Wildcard]);
    assert!(p.ends_with_wildcard());
}

#[test]
fn test_misplaced_wildcard_rejected() {
    assert!(matches!(
        PathPattern::parse("/foo/*/bar"),
        Err(PatternError::MisplacedWildcard { .. })
    ));
}

#[test]
fn test_empty_and_slashes_are_root() {
    for p in ["", "/", "//", "/./"] {
        let pattern = PathPattern::parse(p).unwrap();
        assert!(pattern.is_root(), "{p:?} should be root");
        assert_eq!(pattern.to_string(), "/");
    }
}

#[test]
fn test_parameter_name_errors() {
    assert!(matches!(
        PathPattern::parse("/a/:"),
        Err(PatternError::EmptyParameterName { .. })
    ));
    assert!(matches!(
        PathPattern::parse("/a/{}"),
        Err(PatternError::EmptyParameterName { .. })
    ));
    assert!(matches!(
        PathPattern::parse("/a/:1abc"),
        Err(PatternError::InvalidParameterName { .. })
    ));
    assert!(matches!(
        PathPattern::parse("/a/:id/b/{id}"),
        Err(PatternError::DuplicateParameter { ref name, .. }) if name == "id"
    ));
}

#[test]
fn test_ambiguous_segments_rejected() {
    for p in ["/a/{id", "/a/x{id}", "/files*", "/a/id}"] {
        assert!(
            matches!(PathPattern::parse(p), Err(PatternError::AmbiguousSegment { .. })),
            "{p} should be ambiguous"
        );
    }
}

#[test]
fn test_dot_segments() {
    let p = PathPattern::parse("/a/./b/../c").unwrap();
    assert_eq!(p.segments(), &[Segment::literal("a"), Segment::literal("c")]);
    assert!(matches!(
        PathPattern::parse("/../x"),
        Err(PatternError::EscapesRoot { .. })
    ));
}

#[test]
fn test_optional_param_only_last() {
    let p = PathPattern::parse("/files/:name?").unwrap();
    assert_eq!(p.to_string(), "/files/:name?");
    assert!(matches!(
        PathPattern::parse("/files/:name?/raw"),
        Err(PatternError::MisplacedOptional { .. })
    ));
}

#[test]
fn test_optional_param_matches_with_and_without_value() {
    let p = PathPattern::parse("/files/:name?").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/files"), &mut params));
    assert!(params.is_empty());
    assert!(p.matches(&segs("/files/a.txt"), &mut params));
    assert_eq!(params[0].1, "a.txt");
}

#[test]
fn test_match_binds_params() {
    let p = PathPattern::parse("/foo/:id/bar").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/foo/42/bar"), &mut params));
    assert_eq!(params.len(), 1);
    assert_eq!(&*params[0].0, "id");
    assert_eq!(params[0].1, "42");
}

#[test]
fn test_failed_match_leaves_params_untouched() {
    let p = PathPattern::parse("/foo/:id/bar").unwrap();
    let mut params = ParamVec::new();
    params.push((std::sync::Arc::from("outer"), "x".to_string()));
    assert!(!p.matches(&segs("/foo/42/baz"), &mut params));
    assert!(!p.matches(&segs("/foo/42/bar/extra"), &mut params));
    assert_eq!(params.len(), 1);
}

#[test]
fn test_literal_match_is_case_sensitive() {
    let p = PathPattern::parse("/Users").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/Users"), &mut params));
    assert!(!p.matches(&segs("/users"), &mut params));
}

#[test]
fn test_wildcard_binds_rest() {
    let p = PathPattern::parse("/static/*").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/static/css/site.css"), &mut params));
    assert_eq!(&*params[0].0, CATCH_ALL);
    assert_eq!(params[0].1, "css/site.css");

    params.clear();
    assert!(p.matches(&segs("/static"), &mut params));
    assert_eq!(params[0].1, "");
}

#[test]
fn test_root_matches_only_empty_path() {
    let p = PathPattern::parse("/").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/"), &mut params));
    assert!(p.matches(&segs(""), &mut params));
    assert!(!p.matches(&segs("/a"), &mut params));
}

#[test]
fn test_constraint_filters_values() {
    let mut p = PathPattern::parse("/users/:id").unwrap();
    p.constrain("id", r"\d+").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/users/42"), &mut params));
    assert!(!p.matches(&segs("/users/new"), &mut params));
    assert!(!p.matches(&segs("/users/42x"), &mut params));
}

#[test]
fn test_constraint_errors() {
    let mut p = PathPattern::parse("/users/:id").unwrap();
    assert!(matches!(
        p.constrain("name", ".*"),
        Err(PatternError::UnknownParameter { .. })
    ));
    assert!(matches!(
        p.constrain("id", "(unclosed"),
        Err(PatternError::InvalidConstraint { .. })
    ));
}

#[test]
fn test_split_path_strips_query_and_decodes() {
    let s = split_path("/a%2Fb/c?x=1#frag", true);
    assert_eq!(s.as_slice(), &[Cow::Borrowed("a/b"), Cow::Borrowed("c")]);
    let raw = split_path("/a%2Fb", false);
    assert_eq!(raw[0], "a%2Fb");
}

#[test]
fn test_encoded_literal_pattern_matches_decoded_path() {
    let p = PathPattern::parse("/caf%C3%A9").unwrap();
    let mut params = ParamVec::new();
    assert!(p.matches(&segs("/café"), &mut params));
    assert!(p.matches(&segs("/caf%C3%A9"), &mut params));
}

#[test]
fn test_prefix_normalization() {
    let p = PathPattern::parse("/api").unwrap().into_prefix().unwrap();
    assert_eq!(p.to_string(), "/api/*");
    let mut params = ParamVec::new();
    assert_eq!(p.match_prefix(&segs("/api/v1/x"), &mut params), Some(1));
    assert_eq!(p.match_prefix(&segs("/api"), &mut params), Some(1));
    assert_eq!(p.match_prefix(&segs("/other"), &mut params), None);
    assert!(params.is_empty());
}

#[test]
fn test_render() {
    let p = PathPattern::parse("/users/:id/files/*").unwrap();
    let rendered = p.render(|k| match k {
        "id" => Some("a b"),
        "*" => Some("x/y"),
        _ => None,
    });
    assert_eq!(rendered.as_deref(), Some("/users/a%20b/files/x/y"));
    assert_eq!(p.render(|_| None), None);
}

#[test]
fn test_same_shape_ignores_param_names() {
    let a = PathPattern::parse("/users/:id").unwrap();
    let b = PathPattern::parse("/users/{user}").unwrap();
    let c = PathPattern::parse("/users/new").unwrap();
    assert!(a.same_shape(&b));
    assert!(!a.same_shape(&c));
}

#[test]
fn test_method_set() {
    assert!(MethodSet::only(&[]).is_none());
    let set = MethodSet::only(&[Method::GET, Method::POST, Method::GET]).unwrap();
    assert_eq!(set.to_string(), "GET,POST");
    assert!(set.contains(&Method::POST));
    assert!(!set.contains(&Method::DELETE));
    assert!(MethodSet::All.contains(&Method::DELETE));
    assert_eq!(MethodSet::All.to_string(), "ALL");
}

#[test]
fn test_duplicate_route_rejected() {
    let mut b = Router::builder();
    b.get("/users/:id", ok).unwrap();
    b.get("/users/{other}", ok).unwrap();
    let err = b.build().unwrap_err();
    assert!(matches!(err, RouteError::DuplicateRoute { ref method, .. } if method == "GET"));
}

#[test]
fn test_disjoint_methods_are_not_duplicates() {
    let mut b = Router::builder();
    b.get("/users/:id", ok).unwrap();
    b.post("/users/:id", ok).unwrap();
    b.get("/users/new", ok).unwrap();
    assert!(b.build().is_ok());
}

#[test]
fn test_all_overlaps_everything() {
    let mut b = Router::builder();
    b.delete("/x", ok).unwrap();
    b.all("/x", ok).unwrap();
    assert!(b.build().is_err());
}

#[test]
fn test_shadowed_routes_allowed_by_config() {
    let config = crate::runtime_config::RouterConfig {
        allow_shadowed_routes: true,
        ..Default::default()
    };
    let mut b = RouterBuilder::with_config(config);
    b.get("/x", ok).unwrap();
    b.get("/x", ok).unwrap();
    let router = b.build().unwrap();
    assert_eq!(router.routes().len(), 2);
}

#[test]
fn test_empty_method_list_rejected() {
    let mut b = Router::builder();
    assert!(matches!(
        b.route(&[], "/x", ok),
        Err(RouteError::EmptyMethodSet { .. })
    ));
}

#[test]
fn test_param_schema_errors() {
    let mut b = Router::builder();
    let err = b
        .get("/pets/:id", ok)
        .unwrap()
        .param_schema("name", json!({"type": "string"}))
        .err()
        .unwrap();
    assert!(matches!(err, RouteError::UnknownParameter { .. }));

    let err = b
        .get("/owners/:id", ok)
        .unwrap()
        .param_schema("id", json!({"type": 12}))
        .err()
        .unwrap();
    assert!(matches!(err, RouteError::InvalidSchema { .. }));
}

#[test]
fn test_pattern_error_converts_into_route_error() {
    let mut b = Router::builder();
    let err = b.get("/a/*/b", ok).err().unwrap();
    assert!(matches!(err, RouteError::Pattern(PatternError::MisplacedWildcard { .. })));
    assert!(err.to_string().contains("wildcard"));
}

#[test]
fn test_entries_keep_registration_order_around_open_route() {
    let mut b = Router::builder();
    b.get("/first", ok).unwrap().name("first");
    b.use_fn(|req: &mut Request, next: crate::dispatcher::Next<'_>| next.run(req));
    b.get("/second", ok).unwrap().name("second");
    b.mount("/child", Router::builder().build().unwrap()).unwrap();
    b.get("/third", ok).unwrap().name("third");
    let router = b.build().unwrap();

    let kinds: Vec<String> = router
        .entries()
        .iter()
        .map(|entry| match entry {
            Entry::Middleware(_) => "middleware".to_string(),
            Entry::Mount(_) => "mount".to_string(),
            Entry::Route(route) => route.name().unwrap_or_default().to_string(),
        })
        .collect();
    assert_eq!(kinds, vec!["first", "middleware", "second", "mount", "third"]);
    assert_eq!(router.url_for("third", &[]).as_deref(), Some("/third"));
}
