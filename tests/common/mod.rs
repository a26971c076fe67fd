#![allow(dead_code)]

use mountrouter::dispatcher::{Next, Request, Response};
use serde_json::json;

/// Handler that answers 200 with its tag, the bound params and the
/// middleware trail recorded by [`mark`].
pub fn tagged(tag: &'static str) -> impl Fn(&mut Request) -> Response + Send + Sync + 'static {
    move |req: &mut Request| {
        Response::json(
            200,
            json!({
                "handler": tag,
                "params": req.params_map(),
                "trail": req.state.get("trail").cloned().unwrap_or_else(|| json!([])),
            }),
        )
    }
}

/// Middleware that appends `tag` to the request's `trail` and continues.
pub fn mark(
    tag: &'static str,
) -> impl Fn(&mut Request, Next<'_>) -> Response + Send + Sync + 'static {
    move |req: &mut Request, next: Next<'_>| {
        let trail = req.state.entry("trail").or_insert_with(|| json!([]));
        if let Some(items) = trail.as_array_mut() {
            items.push(json!(tag));
        }
        next.run(req)
    }
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file with the given extension.
    /// The file is removed when the returned handle is dropped.
    pub fn create_temp_table(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("mountrouter_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
