//! Property tests for pattern matching.
//!
//! For any pattern built from literals, parameters and an optional trailing
//! wildcard, a path built by substituting concrete values for each
//! parameter and the wildcard must match and recover exactly those values.

use http::Method;
use mountrouter::dispatcher::{dispatch, Request, Response};
use mountrouter::router::{Router, CATCH_ALL};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Param(String),
}

fn piece() -> impl Strategy<Value = Piece> {
    prop_oneof![
        "[a-z]{1,8}".prop_map(Piece::Literal),
        "[a-z][a-z0-9_]{0,6}".prop_map(Piece::Param),
    ]
}

/// Pattern pieces with unique parameter names, plus whether a wildcard ends it.
fn pattern() -> impl Strategy<Value = (Vec<Piece>, bool)> {
    (prop::collection::vec(piece(), 0..6), any::<bool>()).prop_map(|(pieces, wildcard)| {
        let mut seen = Vec::new();
        let pieces = pieces
            .into_iter()
            .map(|p| match p {
                Piece::Param(name) if seen.contains(&name) => Piece::Literal(format!("x{name}")),
                Piece::Param(name) => {
                    seen.push(name.clone());
                    Piece::Param(name)
                }
                lit => lit,
            })
            .collect();
        (pieces, wildcard)
    })
}

fn ok(_: &mut Request) -> Response {
    Response::json(200, json!({}))
}

proptest! {
    #[test]
    fn prop_substituted_paths_match_and_recover_values(
        (pieces, wildcard) in pattern(),
        values in prop::collection::vec("[ -~]{1,10}", 6),
        rest in prop::collection::vec("[A-Za-z0-9_-]{1,8}", 0..4),
    ) {
        let mut source = String::new();
        let mut path = String::new();
        let mut expected = Vec::new();

        for (i, p) in pieces.iter().enumerate() {
            match p {
                Piece::Literal(text) => {
                    source.push_str(&format!("/{text}"));
                    path.push_str(&format!("/{text}"));
                }
                Piece::Param(name) => {
                    source.push_str(&format!("/:{name}"));
                    path.push('/');
                    path.push_str(&urlencoding::encode(&values[i]));
                    expected.push((name.clone(), values[i].clone()));
                }
            }
        }
        if wildcard {
            source.push_str("/*");
            for seg in &rest {
                path.push('/');
                path.push_str(seg);
            }
            expected.push((CATCH_ALL.to_string(), rest.join("/")));
        }

        let mut b = Router::builder();
        b.get(&source, ok).unwrap();
        let router = b.build().unwrap();

        let m = dispatch(&router, &Method::GET, &path);
        prop_assert!(m.is_ok(), "{} should match {}", path, source);
        let m = m.unwrap();
        let got: Vec<(String, String)> = m
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_dispatch_is_deterministic(
        (pieces, _) in pattern(),
        probe in prop::collection::vec("[a-z]{1,4}", 0..6),
    ) {
        let source: String = pieces
            .iter()
            .map(|p| match p {
                Piece::Literal(t) => format!("/{t}"),
                Piece::Param(n) => format!("/:{n}"),
            })
            .collect();
        let mut b = Router::builder();
        b.get(&source, ok).unwrap();
        let router = b.build().unwrap();

        let path = format!("/{}", probe.join("/"));
        let first = dispatch(&router, &Method::GET, &path).map(|m| m.params);
        let second = dispatch(&router, &Method::GET, &path).map(|m| m.params);
        prop_assert_eq!(first, second);
    }
}
