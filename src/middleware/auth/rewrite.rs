//! Request rewriting used by the enrichment stage.
//!
//! Both helpers return `None` when they decline to rewrite; the caller then
//! forwards the original request untouched.

use axum::http::{HeaderMap, Uri, header};
use serde_json::Value;
use url::form_urlencoded;

/// Append `key=value` to the query string of `uri`.
///
/// Existing pairs are kept byte-for-byte, except pairs with the same key: the
/// appended value is the only one left.
pub fn append_query_param(uri: &Uri, key: &str, value: &str) -> Option<Uri> {
    let mut segments: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .next()
                .is_none_or(|(k, _)| k != key)
        })
        .map(str::to_string)
        .collect();

    segments.push(
        form_urlencoded::Serializer::new(String::new())
            .append_pair(key, value)
            .finish(),
    );

    let path_and_query = format!("{}?{}", uri.path(), segments.join("&"));
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query.parse().ok()?);
    Uri::from_parts(parts).ok()
}

/// Whether the declared content type is JSON (`application/json` or `*/*+json`).
pub fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Parse `body` as a JSON object, set `key` to `value` at the top level and
/// re-serialize.
///
/// Empty bodies, invalid JSON and non-object documents are declined.
pub fn inject_json_field(body: &[u8], key: &str, value: i64) -> Option<Vec<u8>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let mut doc: Value = serde_json::from_slice(body).ok()?;
    doc.as_object_mut()?.insert(key.to_string(), Value::from(value));
    serde_json::to_vec(&doc).ok()
}
