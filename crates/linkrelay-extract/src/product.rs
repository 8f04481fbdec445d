// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product identifier extraction.
//!
//! A shared link is reduced to a [`ProductReference`] by normalising it and
//! running an ordered list of matchers over the result. The first matcher that
//! fires wins, so a URL carrying both a catalog code and a `/dp/` segment is
//! attributed to MarketA.

use std::sync::LazyLock;

use linkrelay_core::{Platform, ProductReference};
use regex::{Captures, Regex};

struct Matcher {
    platform: Platform,
    pattern: Regex,
    id: fn(&Captures<'_>) -> String,
}

/// Matchers in priority order.
static MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        // Catalog codes: MLB123, mlb-123, MLB-123-some-slug
        Matcher {
            platform: Platform::MarketA,
            pattern: Regex::new(r"(?i)\bMLB-?(\d+)").unwrap(),
            id: |caps| format!("MLB{}", &caps[1]),
        },
        // /dp/B00TESTX10, /gp/product/B00TESTX10/
        Matcher {
            platform: Platform::MarketB,
            pattern: Regex::new(r"(?i)/(?:dp|gp/product)/([A-Z0-9]{10})(?:[/?#]|$)").unwrap(),
            id: |caps| caps[1].to_ascii_uppercase(),
        },
    ]
});

/// Reduce a URL to the part that identifies a product: whitespace trimmed,
/// query and fragment dropped, host lowercased.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => {
            let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
            trimmed[..end].to_string()
        }
    }
}

/// Product reference of the first URL any matcher recognises.
pub fn extract<S: AsRef<str>>(urls: &[S]) -> Option<ProductReference> {
    urls.iter().find_map(|url| extract_one(url.as_ref()))
}

/// Product reference of a single URL.
pub fn extract_one(url: &str) -> Option<ProductReference> {
    let normalized = normalize(url);
    MATCHERS.iter().find_map(|matcher| {
        matcher
            .pattern
            .captures(&normalized)
            .map(|caps| ProductReference::new(matcher.platform, (matcher.id)(&caps)))
    })
}

/// Platform a URL belongs to, if it carries a recognisable product id.
pub fn platform_of(url: &str) -> Option<Platform> {
    extract_one(url).map(|reference| reference.platform)
}
