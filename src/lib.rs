#![deny(missing_docs)]
//! Gothik - a Discord bot that turns pasted TikTok links into rich replies
//!
//! Recognizes TikTok links in messages or the `/tiktok` command, looks the
//! post up on the public feed endpoint and replies with the video file or
//! the image carousel and its music track.

/// Discord bot shell and reply composition
pub mod bot;
/// Configuration management
pub mod config;
/// Link recognition, feed client and media access
pub mod tiktok;
/// Text helpers
pub mod utils;
