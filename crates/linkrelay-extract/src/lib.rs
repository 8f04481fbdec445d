// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product identifier extraction, URL rewriting helpers and content
//! fingerprints.
//!
//! Everything here is pure: no I/O, no clock, no failure modes beyond
//! returning `None`.

pub mod fingerprint;
pub mod product;
pub mod urls;

pub use fingerprint::{FingerprintPolicy, content_fingerprint, message_fingerprint};
pub use product::{extract, extract_one, normalize, platform_of};
pub use urls::{
    Storefront, canonical_tagged_url, extract_urls, force_query_param, host_matches, host_of,
    is_short_link, replace_urls, strip_tracking,
};
