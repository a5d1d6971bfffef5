//! Feed document and the post items projected from it.
//!
//! The feed schema is loose, so projection walks a `serde_json::Value` with
//! JSON pointers: missing strings become `""`, missing integers become `0`.

use crate::config::MAX_IMAGES;
use crate::tiktok::TiktokError;
use serde_json::Value;
use tracing::debug;

/// The first entry of a feed response's `aweme_list`.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    /// Raw `aweme_list[0]` object
    pub aweme: Value,
    /// `content_type` is present and not `"video"`
    pub is_image: bool,
}

impl FeedDocument {
    /// Selects `aweme_list[0]` from a parsed feed body.
    ///
    /// A missing `content_type` is treated as a video post.
    ///
    /// # Errors
    ///
    /// Returns `TiktokError::EmptyFeed` if `aweme_list` is missing or empty.
    pub fn from_body(mut body: Value) -> Result<Self, TiktokError> {
        let aweme = body
            .pointer_mut("/aweme_list/0")
            .map(Value::take)
            .filter(|v| !v.is_null())
            .ok_or(TiktokError::EmptyFeed)?;

        let content_type = aweme
            .get("content_type")
            .and_then(Value::as_str)
            .unwrap_or("video");
        let is_image = content_type != "video";
        debug!(content_type, is_image, "Resolved post kind");

        Ok(Self { aweme, is_image })
    }

    fn string_at(&self, pointer: &str) -> String {
        self.aweme
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn u32_at(&self, pointer: &str) -> u32 {
        self.aweme
            .pointer(pointer)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or_default()
    }
}

/// A single playable video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoItem {
    /// Direct media URL without its query string
    pub url: String,
    /// `aweme_id`
    pub id: String,
    /// Author nickname
    pub author: String,
    /// Caption
    pub desc: String,
    /// Width in pixels, 0 when unknown
    pub width: u32,
    /// Height in pixels, 0 when unknown
    pub height: u32,
}

impl VideoItem {
    /// Projects a video post.
    #[must_use]
    pub fn from_feed(doc: &FeedDocument) -> Self {
        debug!("Getting the video link from the JSON body");
        let raw_url = doc.string_at("/video/play_addr/url_list/0");
        let url = raw_url.split('?').next().unwrap_or_default().to_string();

        Self {
            url,
            id: doc.string_at("/aweme_id"),
            author: doc.string_at("/author/nickname"),
            desc: doc.string_at("/desc"),
            width: doc.u32_at("/video/play_addr/width"),
            height: doc.u32_at("/video/play_addr/height"),
        }
    }
}

/// An image carousel with its background track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    /// Image URLs in display order, never empty
    pub urls: Vec<String>,
    /// `aweme_id`
    pub id: String,
    /// Author nickname
    pub author: String,
    /// Caption
    pub desc: String,
    /// Background music URL
    pub music_url: String,
}

impl ImageItem {
    /// Projects an image post.
    ///
    /// Images are read in index order until the first missing or empty
    /// entry, and at most [`MAX_IMAGES`] are kept.
    ///
    /// # Errors
    ///
    /// Returns `TiktokError::NoImages` if not a single image could be read.
    pub fn from_feed(doc: &FeedDocument) -> Result<Self, TiktokError> {
        debug!("Getting the images links from the JSON body");
        let mut urls = Vec::new();
        for i in 0..MAX_IMAGES {
            let url = doc.string_at(&format!(
                "/image_post_info/images/{i}/display_image/url_list/0"
            ));
            if url.is_empty() {
                break;
            }
            debug!(index = i, url = %url, "Image link");
            urls.push(url);
        }

        if urls.is_empty() {
            return Err(TiktokError::NoImages);
        }

        Ok(Self {
            urls,
            id: doc.string_at("/aweme_id"),
            author: doc.string_at("/author/nickname"),
            desc: doc.string_at("/desc"),
            music_url: doc.string_at("/music/play_url/uri"),
        })
    }
}

/// A projected post, ready for reply composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TiktokPost {
    /// Video post
    Video(VideoItem),
    /// Image carousel post
    Images(ImageItem),
}

impl TiktokPost {
    /// Projects a feed document into the variant its `is_image` flag selects.
    ///
    /// # Errors
    ///
    /// Returns `TiktokError::NoImages` for an image post without images.
    pub fn from_feed(doc: &FeedDocument) -> Result<Self, TiktokError> {
        if doc.is_image {
            ImageItem::from_feed(doc).map(Self::Images)
        } else {
            Ok(Self::Video(VideoItem::from_feed(doc)))
        }
    }

    /// `aweme_id` of the post
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Video(v) => &v.id,
            Self::Images(i) => &i.id,
        }
    }
}
