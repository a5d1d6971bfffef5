//! Link recognition and ID extraction.
//!
//! Patterns are compiled once through `lazy_regex!`, which also validates
//! them at compile time.

#![allow(clippy::non_std_lazy_statics)]

use lazy_regex::lazy_regex;
use tracing::debug;

/// Host marker of shortened links
const SHORT_HOST: &str = "vm.tiktok.com";

/// Short form `https://vm.tiktok.com/<9 alnum>/` or canonical form
/// `https://www.tiktok.com/@<handle>/video/<19 digits>` with an optional query.
static RE_TIKTOK_LINK: lazy_regex::Lazy<regex::Regex> = lazy_regex!(
    r"https://vm\.tiktok\.com/[a-zA-Z0-9]{9}/?|https://www\.tiktok\.com/@[a-zA-Z0-9._]{0,32}/video/[0-9]{19}(?:\?\S{0,40})?"
);

/// Returns the first supported TikTok link found anywhere in `text`.
///
/// The search is unanchored and case-sensitive, so a link surrounded by
/// other words still matches.
///
/// # Examples
///
/// ```
/// use gothik_bot::tiktok::link::find_link;
///
/// let text = "check this https://www.tiktok.com/@alice/video/1234567890123456789 lol";
/// assert_eq!(
///     find_link(text),
///     Some("https://www.tiktok.com/@alice/video/1234567890123456789")
/// );
/// assert_eq!(find_link("hello world"), None);
/// ```
#[must_use]
pub fn find_link(text: &str) -> Option<&str> {
    RE_TIKTOK_LINK.find(text).map(|m| m.as_str())
}

/// Checks whether a recognized link is a shortened `vm.tiktok.com` link.
#[must_use]
pub fn is_shortened(url: &str) -> bool {
    let shortened = url.contains(SHORT_HOST);
    debug!(url, shortened, "Checking if link is shortened");
    shortened
}

/// Extracts the `aweme_id` from a canonical link.
///
/// Drops everything from the first `?`, then returns the last non-empty
/// path segment. A trailing slash therefore does not produce an empty id.
#[must_use]
pub fn extract_id(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    let id = path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default();
    debug!(aweme_id = id, "Extracted the ID from the URL");
    id
}
