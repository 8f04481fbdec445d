// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! URL helpers used while rewriting offer text.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use strum::Display;
use url::Url;

/// Bare `http(s)://` runs in free text.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s)>\]]+"#).unwrap());

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '\'', '"'];

fn split_trailing(candidate: &str) -> (&str, &str) {
    let core = candidate.trim_end_matches(TRAILING_PUNCTUATION);
    (core, &candidate[core.len()..])
}

/// Every URL in `text`, trailing punctuation removed, first occurrence order,
/// duplicates dropped.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL_PATTERN
        .find_iter(text)
        .map(|m| split_trailing(m.as_str()).0)
        .filter(|url| {
            url.split_once("://").is_some_and(|(_, rest)| !rest.is_empty()) && seen.insert(*url)
        })
        .map(str::to_string)
        .collect()
}

/// Replace every URL of `text` that appears as a key of `mapping`.
///
/// Trailing punctuation attached to a URL survives the swap; URLs without a
/// mapping are left untouched.
pub fn replace_urls(text: &str, mapping: &[(String, String)]) -> String {
    if mapping.is_empty() {
        return text.to_string();
    }
    URL_PATTERN
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let (core, trailing) = split_trailing(&caps[0]);
            match mapping.iter().find(|(from, _)| from == core) {
                Some((_, to)) => format!("{to}{trailing}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Lowercased host of `url`.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

/// `true` when `host` equals one of `domains` or is a subdomain of one.
pub fn host_matches<S: AsRef<str>>(host: &str, domains: &[S]) -> bool {
    domains.iter().any(|domain| {
        let domain = domain.as_ref().trim().to_ascii_lowercase();
        !domain.is_empty()
            && (host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}

/// Redirect-style share link, e.g. `https://x.example/sec/AB12`.
pub fn is_short_link(url: &str, path_marker: &str) -> bool {
    Url::parse(url.trim())
        .map(|u| u.path().contains(path_marker))
        .unwrap_or(false)
}

/// Storefront family, keyed by host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Storefront {
    MercadoLivre,
    Amazon,
    AliExpress,
    Shopee,
    Magalu,
    Other,
}

impl Storefront {
    pub fn from_url(url: &str) -> Self {
        let Some(host) = host_of(url) else {
            return Self::Other;
        };
        let has = |needle: &str| host.contains(needle);
        if has("mercadolivre") || has("mercadolibre") || has("meli.la") {
            Self::MercadoLivre
        } else if has("amazon.") || has("amzn.") {
            Self::Amazon
        } else if has("aliexpress") {
            Self::AliExpress
        } else if has("shopee") {
            Self::Shopee
        } else if has("magazineluiza") || has("magalu") {
            Self::Magalu
        } else {
            Self::Other
        }
    }

    /// Query parameter carrying the affiliate id on this storefront.
    pub fn affiliate_param(self) -> Option<&'static str> {
        match self {
            Self::Amazon => Some("tag"),
            Self::AliExpress => Some("aff_trace_key"),
            Self::Shopee => Some("af_siteid"),
            Self::Magalu => Some("ref"),
            Self::MercadoLivre | Self::Other => None,
        }
    }
}

/// `scheme://host/dp/{id}/?tag={tag}`; every other parameter of `url` is dropped.
pub fn canonical_tagged_url(url: &str, id: &str, tag: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = match (parsed.host_str()?, parsed.port()) {
        (host, Some(port)) => format!("{host}:{port}"),
        (host, None) => host.to_string(),
    };
    let tag: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();
    Some(format!("{}://{host}/dp/{id}/?tag={tag}", parsed.scheme()))
}

/// Keep `url` as is, except that `name` ends up with exactly one value.
pub fn force_query_param(url: &str, name: &str, value: &str) -> String {
    let trimmed = url.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        let separator = if trimmed.contains('?') { '&' } else { '?' };
        return format!("{trimmed}{separator}{name}={value}");
    };

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, val)| (key.into_owned(), val.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(name, value);
    parsed.to_string()
}

/// `scheme://host/path`, query and fragment removed.
pub fn strip_tracking(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.trim().to_string(),
    }
}
