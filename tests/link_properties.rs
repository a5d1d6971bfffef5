use gothik_bot::tiktok::link::{extract_id, find_link, is_shortened};
use proptest::prelude::*;

fn canonical(handle: &str, id: &str) -> String {
    format!("https://www.tiktok.com/@{handle}/video/{id}")
}

proptest! {
    /// A canonical link is found whole, alone or surrounded by text.
    #[test]
    fn finds_canonical_link(
        handle in "[a-zA-Z0-9._]{0,32}",
        id in "[0-9]{19}",
        prefix in "[a-z ]{0,20}",
        suffix in "( [a-z]{1,10}){0,3}"
    ) {
        let url = canonical(&handle, &id);
        prop_assert_eq!(find_link(&url), Some(url.as_str()));

        let text = format!("{prefix} {url}{suffix}");
        prop_assert_eq!(find_link(&text), Some(url.as_str()));
    }

    /// The extracted id is the 19-digit trailing segment, with or without a query.
    #[test]
    fn extracts_nineteen_digit_id(
        handle in "[a-zA-Z0-9._]{0,32}",
        id in "[0-9]{19}",
        query in "(\\?[a-z]{1,8}=[a-z0-9]{1,8})?"
    ) {
        let url = format!("{}{query}", canonical(&handle, &id));
        let matched = find_link(&url);
        prop_assert!(matched.is_some());
        let extracted = matched.map(extract_id).unwrap_or_default();
        prop_assert_eq!(extracted, id.as_str());
        prop_assert_eq!(extracted.len(), 19);
        prop_assert!(extracted.chars().all(|c| c.is_ascii_digit()));
    }

    /// Classifying a match again yields the same match.
    #[test]
    fn classification_is_idempotent(s in "\\PC{0,40}(https://vm\\.tiktok\\.com/[a-zA-Z0-9]{9}/?)?\\PC{0,40}") {
        if let Some(first) = find_link(&s) {
            prop_assert_eq!(find_link(first), Some(first));
        }
    }

    /// Shortened iff the match is the short form.
    #[test]
    fn shortened_matches_short_form(code in "[a-zA-Z0-9]{9}", slash in proptest::bool::ANY) {
        let url = format!("https://vm.tiktok.com/{code}{}", if slash { "/" } else { "" });
        prop_assert_eq!(find_link(&url), Some(url.as_str()));
        prop_assert!(is_shortened(&url));
    }

    /// Text without a link never matches.
    #[test]
    fn plain_text_has_no_link(s in "[a-zA-Z0-9 .,!?]{0,80}") {
        prop_assert_eq!(find_link(&s), None);
    }
}
