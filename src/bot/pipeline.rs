//! End-to-end resolution of a user-supplied string into a reply.

use crate::bot::reply::{compose, Attachments, Reply};
use crate::tiktok::link::{extract_id, find_link, is_shortened};
use crate::tiktok::{TiktokApi, TiktokPost};
use tracing::{debug, info, warn};

/// A recognized link after short link expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Canonical post URL
    pub url: String,
    /// `aweme_id` taken from the canonical URL
    pub aweme_id: String,
}

/// Finds a link in `raw` and expands it to its canonical form.
///
/// Returns `None` when nothing is recognized or a short link has no
/// usable redirect target.
pub async fn resolve_link<A: TiktokApi + ?Sized>(api: &A, raw: &str) -> Option<ResolvedLink> {
    let matched = find_link(raw)?;
    debug!(url = matched, "Detected a TikTok link");

    let url = if is_shortened(matched) {
        match api.expand_short_url(matched).await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                warn!(url = matched, "Short link redirected to an empty location");
                return None;
            }
            Err(e) => {
                warn!(url = matched, error = %e, "Couldn't resolve short link");
                return None;
            }
        }
    } else {
        matched.to_string()
    };

    let aweme_id = extract_id(&url).to_string();
    Some(ResolvedLink { url, aweme_id })
}

/// Resolves `raw` into a composed reply.
///
/// Every failure is logged and collapses into `None`, which callers treat
/// as "no reply".
pub async fn resolve<A: TiktokApi + ?Sized>(
    api: &A,
    raw: &str,
    requester: Option<&str>,
    attachments: Attachments,
) -> Option<Reply> {
    let link = resolve_link(api, raw).await?;

    let doc = match api.fetch_post(&link.aweme_id).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(aweme_id = %link.aweme_id, error = %e, "Couldn't retrieve TikTok");
            return None;
        }
    };
    info!(aweme_id = %link.aweme_id, is_image = doc.is_image, "Fetched post");

    let post = match TiktokPost::from_feed(&doc) {
        Ok(post) => post,
        Err(e) => {
            warn!(aweme_id = %link.aweme_id, error = %e, "Couldn't extract post");
            return None;
        }
    };

    Some(compose(api, &post, &link.url, requester, attachments).await)
}
