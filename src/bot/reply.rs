//! Reply composition.
//!
//! Builds a platform-neutral [`Reply`] from a projected post. Text and embed
//! layout are pure functions; the only I/O is opening media streams for the
//! attachments.

use crate::config::{
    DISCORD_EMBED_DESCRIPTION_LIMIT, DISCORD_MESSAGE_LIMIT, EMBED_TITLE_PREFIX, MAX_EMBEDS,
};
use crate::tiktok::media::{open_music, open_video};
use crate::tiktok::{ImageItem, MediaStream, TiktokApi, TiktokError, TiktokPost, VideoItem};
use crate::utils::truncate_with_ellipsis;
use tracing::warn;

/// MIME type of video attachments
pub const VIDEO_MIME: &str = "video/mp4";
/// MIME type of music attachments
pub const MUSIC_MIME: &str = "audio/mp3";

/// Whether media attachments should be downloaded for a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachments {
    /// Open media streams and attach them
    Include,
    /// Text and embeds only
    Omit,
}

/// An outbound message, independent of the chat SDK
#[derive(Debug, Default)]
pub struct Reply {
    /// Canonical post URL the reply was built from
    pub post_url: String,
    /// Message text, may be empty for image posts
    pub content: String,
    /// Preview cards
    pub embeds: Vec<ReplyEmbed>,
    /// Files to upload
    pub attachments: Vec<ReplyAttachment>,
}

impl Reply {
    /// Text used where only plain content can be sent.
    ///
    /// Image replies carry no content, so the post URL stands in for it.
    #[must_use]
    pub fn text_or_link(&self) -> &str {
        if self.content.is_empty() {
            &self.post_url
        } else {
            &self.content
        }
    }
}

/// One preview card of an image reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEmbed {
    /// Card title
    pub title: String,
    /// Card body
    pub description: String,
    /// Link opened by the title
    pub url: String,
    /// Image shown in the card
    pub image_url: String,
}

/// A file attachment backed by an open media stream
#[derive(Debug)]
pub struct ReplyAttachment {
    /// Upload file name
    pub filename: String,
    /// MIME type
    pub content_type: &'static str,
    /// Body, consumed once on upload
    pub stream: MediaStream,
}

/// Text of a video reply.
#[must_use]
pub fn video_content(item: &VideoItem, post_url: &str, requester: Option<&str>) -> String {
    let requested_by = requester
        .map(|id| format!("**Requested by <@{id}>**\n"))
        .unwrap_or_default();
    let content = format!(
        "{requested_by}**Author: **{}\n**Desc:** {}\n[Tiktok link](<{post_url}>)\n[Raw video link](<{}>)",
        item.author, item.desc, item.url
    );
    truncate_with_ellipsis(&content, DISCORD_MESSAGE_LIMIT)
}

/// Description shared by every embed of an image reply.
#[must_use]
pub fn image_description(item: &ImageItem, requester: Option<&str>) -> String {
    let description = match requester {
        Some(id) => format!(
            "Requested by <@{id}>\n{}\n[Music link]({})",
            item.desc, item.music_url
        ),
        None => item.desc.clone(),
    };
    truncate_with_ellipsis(&description, DISCORD_EMBED_DESCRIPTION_LIMIT)
}

/// Embeds of an image reply, at most [`MAX_EMBEDS`].
#[must_use]
pub fn image_embeds(item: &ImageItem, post_url: &str, requester: Option<&str>) -> Vec<ReplyEmbed> {
    let title = format!("{EMBED_TITLE_PREFIX} | {}", item.author);
    let description = image_description(item, requester);

    item.urls
        .iter()
        .take(MAX_EMBEDS)
        .map(|image_url| ReplyEmbed {
            title: title.clone(),
            description: description.clone(),
            url: post_url.to_string(),
            image_url: image_url.clone(),
        })
        .collect()
}

/// Composes the reply for a projected post.
///
/// Media that cannot be opened is left out; the rest of the reply is kept.
pub async fn compose<A: TiktokApi + ?Sized>(
    api: &A,
    post: &TiktokPost,
    post_url: &str,
    requester: Option<&str>,
    attachments: Attachments,
) -> Reply {
    let mut reply = Reply {
        post_url: post_url.to_string(),
        ..Reply::default()
    };

    match post {
        TiktokPost::Video(item) => {
            reply.content = video_content(item, post_url, requester);
            if attachments == Attachments::Include {
                let filename = format!("{}.mp4", item.id);
                reply.attachments.extend(attachment(
                    open_video(api, item).await,
                    filename,
                    VIDEO_MIME,
                ));
            }
        }
        TiktokPost::Images(item) => {
            reply.embeds = image_embeds(item, post_url, requester);
            if attachments == Attachments::Include {
                let filename = format!("{}_music.mp3", item.id);
                reply.attachments.extend(attachment(
                    open_music(api, item).await,
                    filename,
                    MUSIC_MIME,
                ));
            }
        }
    }

    reply
}

fn attachment(
    stream: Result<MediaStream, TiktokError>,
    filename: String,
    content_type: &'static str,
) -> Option<ReplyAttachment> {
    match stream {
        Ok(stream) => Some(ReplyAttachment {
            filename,
            content_type,
            stream,
        }),
        Err(e) => {
            warn!(filename = %filename, error = %e, "Couldn't download media, sending reply without attachment");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiktok::MockTiktokApi;

    const POST_URL: &str = "https://www.tiktok.com/@alice/video/1234567890123456789";

    fn video() -> VideoItem {
        VideoItem {
            url: "https://cdn/x.mp4".to_string(),
            id: "1234567890123456789".to_string(),
            author: "alice".to_string(),
            desc: "hi".to_string(),
            width: 0,
            height: 0,
        }
    }

    fn images(count: usize) -> ImageItem {
        ImageItem {
            urls: (0..count).map(|i| format!("https://cdn/{i}.jpg")).collect(),
            id: "7000000000000000001".to_string(),
            author: "carol".to_string(),
            desc: "carousel".to_string(),
            music_url: "https://cdn/m.mp3".to_string(),
        }
    }

    #[test]
    fn test_video_content_with_requester() {
        assert_eq!(
            video_content(&video(), POST_URL, Some("42")),
            "**Requested by <@42>**\n**Author: **alice\n**Desc:** hi\n\
             [Tiktok link](<https://www.tiktok.com/@alice/video/1234567890123456789>)\n\
             [Raw video link](<https://cdn/x.mp4>)"
        );
    }

    #[test]
    fn test_video_content_without_requester() {
        let content = video_content(&video(), POST_URL, None);
        assert!(content.starts_with("**Author: **alice\n"));
        assert!(!content.contains("Requested by"));
    }

    #[test]
    fn test_video_content_truncated_to_message_limit() {
        let mut item = video();
        item.desc = "d".repeat(3000);
        let content = video_content(&item, POST_URL, None);
        assert_eq!(content.chars().count(), DISCORD_MESSAGE_LIMIT);
    }

    #[test]
    fn test_image_description() {
        let item = images(1);
        assert_eq!(
            image_description(&item, Some("42")),
            "Requested by <@42>\ncarousel\n[Music link](https://cdn/m.mp3)"
        );
        assert_eq!(image_description(&item, None), "carousel");
    }

    #[test]
    fn test_image_embeds() {
        let embeds = image_embeds(&images(3), POST_URL, None);
        assert_eq!(embeds.len(), 3);
        for (i, embed) in embeds.iter().enumerate() {
            assert_eq!(embed.title, "Gothik | carol");
            assert_eq!(embed.url, POST_URL);
            assert_eq!(embed.image_url, format!("https://cdn/{i}.jpg"));
        }
    }

    #[test]
    fn test_image_embeds_capped() {
        let embeds = image_embeds(&images(12), POST_URL, None);
        assert_eq!(embeds.len(), MAX_EMBEDS);
        assert_eq!(embeds[7].image_url, "https://cdn/7.jpg");
    }

    #[tokio::test]
    async fn test_compose_video_attaches_stream() {
        let mut api = MockTiktokApi::new();
        api.expect_open_media()
            .withf(|url| url.ends_with("/x.mp4"))
            .times(1)
            .returning(|_| Ok(MediaStream::from_bytes(&b"mp4"[..])));

        let reply = compose(
            &api,
            &TiktokPost::Video(video()),
            POST_URL,
            Some("42"),
            Attachments::Include,
        )
        .await;

        assert_eq!(reply.attachments.len(), 1);
        assert_eq!(reply.attachments[0].filename, "1234567890123456789.mp4");
        assert_eq!(reply.attachments[0].content_type, VIDEO_MIME);
        assert!(reply.embeds.is_empty());
    }

    #[tokio::test]
    async fn test_compose_images_attaches_music() {
        let mut api = MockTiktokApi::new();
        api.expect_open_media()
            .withf(|url| url.ends_with("/m.mp3"))
            .times(1)
            .returning(|_| Ok(MediaStream::from_bytes(&b"mp3"[..])));

        let reply = compose(
            &api,
            &TiktokPost::Images(images(3)),
            POST_URL,
            None,
            Attachments::Include,
        )
        .await;

        assert!(reply.content.is_empty());
        assert_eq!(reply.embeds.len(), 3);
        assert_eq!(reply.attachments.len(), 1);
        assert_eq!(reply.attachments[0].filename, "7000000000000000001_music.mp3");
        assert_eq!(reply.attachments[0].content_type, MUSIC_MIME);
        assert_eq!(reply.text_or_link(), POST_URL);
    }

    #[tokio::test]
    async fn test_compose_drops_failed_attachment() {
        let mut api = MockTiktokApi::new();
        api.expect_open_media()
            .returning(|_| Err(TiktokError::Network("timed out".to_string())));

        let reply = compose(
            &api,
            &TiktokPost::Video(video()),
            POST_URL,
            None,
            Attachments::Include,
        )
        .await;

        assert!(reply.attachments.is_empty());
        assert!(reply.content.contains("**Author: **alice"));
    }

    #[tokio::test]
    async fn test_compose_without_attachments_opens_nothing() {
        let mut api = MockTiktokApi::new();
        api.expect_open_media().never();

        let reply = compose(
            &api,
            &TiktokPost::Video(video()),
            POST_URL,
            None,
            Attachments::Omit,
        )
        .await;

        assert!(reply.attachments.is_empty());
        assert_eq!(reply.text_or_link(), reply.content);
    }
}
