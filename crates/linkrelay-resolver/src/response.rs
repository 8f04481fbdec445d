// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Picks the affiliate link out of a link-creation response.
//!
//! The endpoint's exact schema is not relied upon. A response is accepted if
//! any string in it (searched recursively) contains the short-link path, or
//! if it carries an id-like field the short link can be built from.

use linkrelay_extract::extract_urls;
use serde_json::Value;
use url::Url;

/// Field names that may hold a bare short-link id, in preference order.
const ID_FIELDS: &[&str] = &["id", "short_id", "code"];

/// The affiliate URL contained in `body`, if any.
///
/// `canonical_url` supplies the scheme and host for links built from an id
/// or from a relative path.
pub fn extract_short_link(body: &str, path_marker: &str, canonical_url: &str) -> Option<String> {
    let origin = origin_of(canonical_url);

    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return extract_urls(body)
            .into_iter()
            .find(|u| u.contains(path_marker));
    };

    if let Some(found) = find_string(&json, &|s: &str| s.contains(path_marker)) {
        return absolutize(found, origin.as_deref());
    }

    let id = ID_FIELDS.iter().find_map(|field| find_field(&json, field))?;
    let origin = origin?;
    let path = format!("/{}/", path_marker.trim_matches('/'));
    Some(format!("{origin}{path}{id}"))
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    })
}

fn absolutize(found: &str, origin: Option<&str>) -> Option<String> {
    let found = found.trim();
    if found.starts_with("http://") || found.starts_with("https://") {
        Some(found.to_string())
    } else if found.starts_with('/') {
        origin.map(|o| format!("{o}{found}"))
    } else {
        None
    }
}

/// Depth-first search for a string value satisfying `pred`.
fn find_string<'a>(value: &'a Value, pred: &dyn Fn(&str) -> bool) -> Option<&'a str> {
    match value {
        Value::String(s) if pred(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(|v| find_string(v, pred)),
        Value::Object(map) => map.values().find_map(|v| find_string(v, pred)),
        _ => None,
    }
}

/// Depth-first search for a non-empty string or number under key `field`.
fn find_field(value: &Value, field: &str) -> Option<String> {
    match value {
        Value::Object(map) => {
            let direct = map.get(field).and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
            direct.or_else(|| map.values().find_map(|v| find_field(v, field)))
        }
        Value::Array(items) => items.iter().find_map(|v| find_field(v, field)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "https://x.example/item/MLB999";

    #[test]
    fn id_field_builds_link_on_canonical_host() {
        assert_eq!(
            extract_short_link(r#"{"id":"ZZ9"}"#, "/sec/", CANONICAL).as_deref(),
            Some("https://x.example/sec/ZZ9")
        );
    }

    #[test]
    fn nested_url_wins_over_id() {
        let body = r#"{"id":"ignored","data":{"links":[{"url":"https://x.example/sec/Q1"}]}}"#;
        assert_eq!(
            extract_short_link(body, "/sec/", CANONICAL).as_deref(),
            Some("https://x.example/sec/Q1")
        );
    }

    #[test]
    fn relative_path_is_joined_with_origin() {
        assert_eq!(
            extract_short_link(r#"{"short":"/sec/R2"}"#, "/sec/", "http://127.0.0.1:9000/item/MLB1")
                .as_deref(),
            Some("http://127.0.0.1:9000/sec/R2")
        );
    }

    #[test]
    fn numeric_code_is_accepted() {
        assert_eq!(
            extract_short_link(r#"{"result":{"code":42}}"#, "/sec/", CANONICAL).as_deref(),
            Some("https://x.example/sec/42")
        );
    }

    #[test]
    fn plain_text_body_is_scanned() {
        assert_eq!(
            extract_short_link("created: https://x.example/sec/T3.", "/sec/", CANONICAL).as_deref(),
            Some("https://x.example/sec/T3")
        );
    }

    #[test]
    fn unrelated_body_yields_none() {
        assert_eq!(extract_short_link(r#"{"ok":true}"#, "/sec/", CANONICAL), None);
        assert_eq!(extract_short_link("<html>nope</html>", "/sec/", CANONICAL), None);
        assert_eq!(extract_short_link(r#"{"id":""}"#, "/sec/", CANONICAL), None);
    }
}
