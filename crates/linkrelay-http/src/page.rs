// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Markup scanning for fetched pages.
//!
//! This is deliberately shallow: tag and attribute regexes, no DOM. Pages
//! that need script execution are out of reach for this driver.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static META_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").unwrap());

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[a-zA-Z][^>]*>").unwrap());

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

static INNER_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static REFRESH_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)url\s*=\s*['"]?([^'"\s;]+)"#).unwrap());

/// Attribute name/value pairs of one tag, names lowercased.
fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(tag)
        .filter_map(|c| {
            let name = c.get(1)?.as_str().to_ascii_lowercase();
            let value = c.get(2).or_else(|| c.get(3)).or_else(|| c.get(4))?;
            Some((name, value.as_str().to_string()))
        })
        .collect()
}

fn attribute<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Target of a `<meta http-equiv="refresh">`, resolved against `base`.
pub fn meta_refresh_target(body: &str, base: &str) -> Option<String> {
    META_TAG.find_iter(body).find_map(|m| {
        let attrs = attributes(m.as_str());
        let equiv = attribute(&attrs, "http-equiv")?;
        if !equiv.eq_ignore_ascii_case("refresh") {
            return None;
        }
        let content = attribute(&attrs, "content")?;
        let target = REFRESH_URL.captures(content)?.get(1)?.as_str();
        join(base, target)
    })
}

/// `href` of the first anchor whose visible text contains any hint.
///
/// Hints are tried in order and compared case-insensitively.
pub fn anchor_target<S: AsRef<str>>(body: &str, base: &str, hints: &[S]) -> Option<String> {
    let anchors: Vec<(String, String)> = ANCHOR
        .captures_iter(body)
        .filter_map(|c| {
            let attrs = attributes(c.get(1)?.as_str());
            let href = attribute(&attrs, "href")?.to_string();
            let text = INNER_TAG.replace_all(c.get(2)?.as_str(), " ");
            Some((href, text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()))
        })
        .collect();

    hints.iter().find_map(|hint| {
        let hint = hint.as_ref().trim().to_lowercase();
        if hint.is_empty() {
            return None;
        }
        anchors
            .iter()
            .find(|(_, text)| text.contains(&hint))
            .and_then(|(href, _)| join(base, href))
    })
}

/// First non-empty embedded value named by any hint.
///
/// Each hint is looked up, in order, as a `<meta name|property>` tag, as a
/// tag attribute (`hint` itself or `data-hint`), and as a JSON string field.
pub fn marker_value<S: AsRef<str>>(body: &str, hints: &[S]) -> Option<String> {
    hints.iter().find_map(|hint| {
        let hint = hint.as_ref().trim();
        if hint.is_empty() {
            return None;
        }
        meta_content(body, hint)
            .or_else(|| attribute_value(body, hint))
            .or_else(|| json_field(body, hint))
    })
}

fn meta_content(body: &str, hint: &str) -> Option<String> {
    META_TAG.find_iter(body).find_map(|m| {
        let attrs = attributes(m.as_str());
        let named = attribute(&attrs, "name")
            .or_else(|| attribute(&attrs, "property"))
            .is_some_and(|n| n.eq_ignore_ascii_case(hint));
        if !named {
            return None;
        }
        non_empty(attribute(&attrs, "content")?)
    })
}

fn attribute_value(body: &str, hint: &str) -> Option<String> {
    let data_name = format!("data-{hint}");
    ANY_TAG.find_iter(body).find_map(|m| {
        let attrs = attributes(m.as_str());
        attribute(&attrs, hint)
            .or_else(|| attribute(&attrs, &data_name))
            .and_then(non_empty)
    })
}

fn json_field(body: &str, hint: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"([^"\\]*)""#, regex::escape(hint));
    let re = Regex::new(&pattern).ok()?;
    re.captures_iter(body)
        .find_map(|c| non_empty(c.get(1)?.as_str()))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn join(base: &str, target: &str) -> Option<String> {
    let target = target.trim().replace("&amp;", "&");
    match Url::parse(base) {
        Ok(base) => base.join(&target).ok().map(String::from),
        Err(_) => Url::parse(&target).ok().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://x.example/social/list";

    #[test]
    fn refresh_target_is_absolutized() {
        let body = r#"<head><meta http-equiv="Refresh" content="0; url=/item/MLB999"></head>"#;
        assert_eq!(
            meta_refresh_target(body, BASE).as_deref(),
            Some("https://x.example/item/MLB999")
        );
        assert_eq!(meta_refresh_target("<meta charset=utf-8>", BASE), None);
    }

    #[test]
    fn anchor_text_matches_hint_case_insensitively() {
        let body = r#"
            <a href="/help">Ajuda</a>
            <a class="btn" href="https://x.example/item/MLB1?a=1&amp;b=2"><span>Ir para</span> PRODUTO</a>
        "#;
        assert_eq!(
            anchor_target(body, BASE, &["ir para produto"]).as_deref(),
            Some("https://x.example/item/MLB1?a=1&b=2")
        );
        assert_eq!(anchor_target(body, BASE, &["comprar"]), None);
    }

    #[test]
    fn hints_are_tried_in_order() {
        let body = r#"<a href="/one">first</a><a href="/two">second</a>"#;
        assert_eq!(
            anchor_target(body, BASE, &["second", "first"]).as_deref(),
            Some("https://x.example/two")
        );
    }

    #[test]
    fn marker_from_meta_tag() {
        let body = r#"<meta content="tok-1" name="csrf-token">"#;
        assert_eq!(marker_value(body, &["csrf-token"]).as_deref(), Some("tok-1"));
    }

    #[test]
    fn marker_from_data_attribute() {
        let body = r#"<div id="p" data-asin='B00TESTX10'></div>"#;
        assert_eq!(marker_value(body, &["asin"]).as_deref(), Some("B00TESTX10"));
        assert_eq!(marker_value(body, &["data-asin"]).as_deref(), Some("B00TESTX10"));
    }

    #[test]
    fn marker_from_embedded_json() {
        let body = r#"<script>window.__S = {"csrfToken" : "abc123", "x": 1}</script>"#;
        assert_eq!(marker_value(body, &["missing", "csrfToken"]).as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_values_are_skipped() {
        let body = r#"<meta name="csrf" content=""><script>{"csrf":"later"}</script>"#;
        assert_eq!(marker_value(body, &["csrf"]).as_deref(), Some("later"));
        assert_eq!(marker_value(body, &["", "nothing"]), None);
    }
}
