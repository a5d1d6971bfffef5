//! Conversion of a [`Reply`] into serenity message builders.

use crate::bot::reply::{Reply, ReplyAttachment, ReplyEmbed};
use serenity::all::{CreateAttachment, CreateEmbed, CreateMessage};
use tracing::{debug, warn};

fn embed(embed: ReplyEmbed) -> CreateEmbed {
    CreateEmbed::new()
        .title(embed.title)
        .description(embed.description)
        .url(embed.url)
        .image(embed.image_url)
}

/// Reads an attachment body into memory for upload.
///
/// Returns `None` when the download fails or exceeds `max_bytes`; the reply
/// is then sent without this file.
pub async fn upload_attachment(
    attachment: ReplyAttachment,
    max_bytes: usize,
) -> Option<CreateAttachment> {
    let ReplyAttachment {
        filename,
        content_type,
        stream,
    } = attachment;

    match stream.collect_limited(max_bytes).await {
        Ok(data) => {
            debug!(filename = %filename, content_type, bytes = data.len(), "Attachment downloaded");
            Some(CreateAttachment::bytes(data, filename))
        }
        Err(e) => {
            warn!(filename = %filename, error = %e, "Dropping attachment");
            None
        }
    }
}

/// Builds the channel message for a reply, downloading its attachments.
pub async fn create_message(reply: Reply, max_attachment_bytes: usize) -> CreateMessage {
    let Reply {
        content,
        embeds,
        attachments,
        ..
    } = reply;

    let mut files = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        if let Some(file) = upload_attachment(attachment, max_attachment_bytes).await {
            files.push(file);
        }
    }

    let mut message = CreateMessage::new()
        .embeds(embeds.into_iter().map(embed).collect())
        .add_files(files);
    if !content.is_empty() {
        message = message.content(content);
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiktok::MediaStream;

    #[tokio::test]
    async fn test_upload_attachment_within_limit() {
        let attachment = ReplyAttachment {
            filename: "1.mp4".to_string(),
            content_type: "video/mp4",
            stream: MediaStream::from_bytes(&b"abc"[..]),
        };
        let file = upload_attachment(attachment, 1024).await;
        let Some(file) = file else {
            panic!("attachment should be kept");
        };
        assert_eq!(file.filename, "1.mp4");
        assert_eq!(file.data, b"abc".to_vec());
    }

    #[tokio::test]
    async fn test_upload_attachment_over_limit() {
        let attachment = ReplyAttachment {
            filename: "1.mp4".to_string(),
            content_type: "video/mp4",
            stream: MediaStream::from_bytes(vec![0_u8; 64]),
        };
        assert!(upload_attachment(attachment, 16).await.is_none());
    }
}
