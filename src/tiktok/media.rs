//! Streaming handle over a media download.

use crate::tiktok::{ImageItem, TiktokApi, TiktokError, VideoItem};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};

/// A one-shot stream over a media response body.
///
/// The underlying connection is released when the stream is dropped, so every
/// exit path of the caller closes it.
pub struct MediaStream {
    content_length: Option<u64>,
    body: BoxStream<'static, Result<Bytes, TiktokError>>,
}

impl MediaStream {
    /// Wraps a successful HTTP response.
    #[must_use]
    pub fn from_response(response: reqwest::Response) -> Self {
        let content_length = response.content_length();
        let body = response.bytes_stream().map_err(TiktokError::from).boxed();
        Self {
            content_length,
            body,
        }
    }

    /// Builds a stream over an in-memory body.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            content_length: Some(data.len() as u64),
            body: stream::once(async move { Ok(data) }).boxed(),
        }
    }

    /// Consumes the stream, stopping as soon as `limit` bytes are exceeded.
    ///
    /// # Errors
    ///
    /// Returns `TiktokError::MediaTooLarge` when the body is larger than
    /// `limit`, or `TiktokError::Network` when reading fails midway.
    pub async fn collect_limited(mut self, limit: usize) -> Result<Vec<u8>, TiktokError> {
        if self
            .content_length
            .is_some_and(|len| usize::try_from(len).map_or(true, |len| len > limit))
        {
            return Err(TiktokError::MediaTooLarge { limit });
        }

        let mut data = Vec::with_capacity(
            self.content_length
                .and_then(|len| usize::try_from(len).ok())
                .unwrap_or_default(),
        );
        while let Some(chunk) = self.body.next().await {
            let chunk = chunk?;
            if data.len() + chunk.len() > limit {
                return Err(TiktokError::MediaTooLarge { limit });
            }
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Opens the video file of a video post.
///
/// # Errors
///
/// Returns the transport or status error of the download request.
pub async fn open_video<A: TiktokApi + ?Sized>(
    api: &A,
    item: &VideoItem,
) -> Result<MediaStream, TiktokError> {
    api.open_media(&item.url).await
}

/// Opens the background track of an image post.
///
/// # Errors
///
/// Returns `TiktokError::Api` when the post has no music URL, otherwise the
/// transport or status error of the download request.
pub async fn open_music<A: TiktokApi + ?Sized>(
    api: &A,
    item: &ImageItem,
) -> Result<MediaStream, TiktokError> {
    if item.music_url.is_empty() {
        return Err(TiktokError::Api("post has no music URL".to_string()));
    }
    api.open_media(&item.music_url).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_within_limit() {
        let data = MediaStream::from_bytes(vec![1_u8, 2, 3])
            .collect_limited(3)
            .await;
        assert!(matches!(data.as_deref(), Ok([1, 2, 3])));
    }

    #[tokio::test]
    async fn test_collect_over_limit() {
        let result = MediaStream::from_bytes(vec![0_u8; 10])
            .collect_limited(4)
            .await;
        assert!(matches!(
            result,
            Err(TiktokError::MediaTooLarge { limit: 4 })
        ));
    }

    #[tokio::test]
    async fn test_collect_over_limit_without_length() {
        let chunks = vec![Ok(Bytes::from_static(b"abc")), Ok(Bytes::from_static(b"def"))];
        let media = MediaStream {
            content_length: None,
            body: stream::iter(chunks).boxed(),
        };
        let result = media.collect_limited(5).await;
        assert!(matches!(
            result,
            Err(TiktokError::MediaTooLarge { limit: 5 })
        ));
    }

    #[tokio::test]
    async fn test_collect_propagates_read_error() {
        let chunks = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(TiktokError::Network("connection reset".to_string())),
        ];
        let media = MediaStream {
            content_length: None,
            body: stream::iter(chunks).boxed(),
        };
        assert!(matches!(
            media.collect_limited(100).await,
            Err(TiktokError::Network(_))
        ));
    }
}
