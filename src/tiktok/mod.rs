//! TikTok link recognition, feed lookup and media access.
//!
//! The flow for one link is: [`link::find_link`] → [`TiktokApi::expand_short_url`]
//! (shortened links only) → [`link::extract_id`] → [`TiktokApi::fetch_post`] →
//! [`models::TiktokPost::from_feed`] → [`TiktokApi::open_media`].

pub mod client;
pub mod link;
pub mod media;
pub mod models;

pub use client::{TiktokApi, TiktokClient};
pub use media::MediaStream;
pub use models::{FeedDocument, ImageItem, TiktokPost, VideoItem};

#[cfg(test)]
pub use client::MockTiktokApi;

use thiserror::Error;

/// Errors that can occur while resolving a TikTok link
#[derive(Debug, Error)]
pub enum TiktokError {
    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),
    /// The platform answered with a non-success status
    #[error("API error: {0}")]
    Api(String),
    /// The feed body could not be parsed
    #[error("JSON error: {0}")]
    Json(String),
    /// `aweme_list` was missing or empty
    #[error("Feed returned no post")]
    EmptyFeed,
    /// The short link response carried no `Location` header
    #[error("Short link has no redirect target")]
    MissingRedirect,
    /// An image post without a single readable image
    #[error("Image post contains no images")]
    NoImages,
    /// Media body exceeded the attachment limit
    #[error("Media exceeds the {limit} byte attachment limit")]
    MediaTooLarge {
        /// Limit that was exceeded, in bytes
        limit: usize,
    },
}

impl From<reqwest::Error> for TiktokError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
