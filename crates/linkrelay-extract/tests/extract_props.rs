// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property tests: query strings, fragments and letter case never change the
//! extracted product reference.

use linkrelay_core::Platform;
use linkrelay_extract::{FingerprintPolicy, content_fingerprint, extract_one};
use proptest::prelude::*;

fn decorate(base: &str, query: &str, fragment: &str, upper: bool) -> String {
    let mut url = base.to_string();
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    if !fragment.is_empty() {
        url.push('#');
        url.push_str(fragment);
    }
    if upper {
        url.to_ascii_uppercase()
    } else {
        url.to_ascii_lowercase()
    }
}

proptest! {
    #[test]
    fn catalog_code_survives_decoration(
        digits in "[1-9][0-9]{0,11}",
        hyphen in any::<bool>(),
        query in "[a-z0-9_=&]{0,24}",
        fragment in "[a-z0-9]{0,12}",
        upper in any::<bool>(),
    ) {
        let sep = if hyphen { "-" } else { "" };
        let base = format!("https://Shop.Example/item/MLB{sep}{digits}");
        let plain = extract_one(&base).expect("base matches");
        let decorated = extract_one(&decorate(&base, &query, &fragment, upper))
            .expect("decorated matches");
        prop_assert_eq!(&plain, &decorated);
        prop_assert_eq!(plain.platform, Platform::MarketA);
        prop_assert_eq!(plain.id, format!("MLB{digits}"));
    }

    #[test]
    fn dp_code_survives_decoration(
        code in "[A-Z0-9]{10}",
        query in "[a-z0-9_=&]{0,24}",
        fragment in "[a-z0-9]{0,12}",
        upper in any::<bool>(),
    ) {
        // A code that itself reads as a catalog code belongs to MarketA.
        prop_assume!(!code.starts_with("MLB"));
        let base = format!("https://y.example/dp/{code}");
        let decorated = extract_one(&decorate(&base, &query, &fragment, upper))
            .expect("decorated matches");
        prop_assert_eq!(decorated.platform, Platform::MarketB);
        prop_assert_eq!(decorated.id, code);
    }

    #[test]
    fn content_fingerprint_ignores_link_decoration(
        digits in "[1-9][0-9]{0,8}",
        query in "[a-z0-9_=&]{1,24}",
        text_a in "[a-z ]{0,30}",
        text_b in "[a-z ]{0,30}",
    ) {
        let policy = FingerprintPolicy::default();
        let a = content_fingerprint(&text_a, &[format!("https://x.example/item/MLB{digits}")], &policy);
        let b = content_fingerprint(&text_b, &[format!("https://x.example/MLB-{digits}?{query}")], &policy);
        prop_assert_eq!(a, b);
    }
}
