//! Configuration and settings management
//!
//! Loads settings from environment variables, `.env` and optional config files,
//! and defines the limits the bot works within.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the registered slash command
pub const COMMAND_NAME: &str = "tiktok";
/// Description of the registered slash command
pub const COMMAND_DESCRIPTION: &str = "Embeds a TikTok video with a direct link to it";
/// Name of the required string option of the slash command
pub const COMMAND_OPTION: &str = "link";
/// Description of the slash command option
pub const COMMAND_OPTION_DESCRIPTION: &str = "Video link";

/// Prefix used in every image embed title
pub const EMBED_TITLE_PREFIX: &str = "Gothik";
/// Maximum number of embeds attached to one image reply
pub const MAX_EMBEDS: usize = 8;
/// Upper bound on images read from a single feed document
pub const MAX_IMAGES: usize = 64;

/// Discord message content limit (characters)
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;
/// Discord embed description limit (characters)
pub const DISCORD_EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Path of the public feed endpoint, relative to the feed host
pub const FEED_PATH: &str = "/aweme/v1/feed/";

/// Application settings loaded from the environment
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Discord bot token (`DISCORD_BOT_TOKEN`)
    pub discord_bot_token: String,

    /// Base URL of the public feed endpoint
    #[serde(default = "default_feed_base_url")]
    pub tiktok_feed_base_url: String,

    /// Per-request deadline for every outbound request
    #[serde(default = "default_http_timeout_secs")]
    pub tiktok_http_timeout_secs: u64,

    /// User agent sent to the platform
    #[serde(default = "default_user_agent")]
    pub tiktok_user_agent: String,

    /// Media larger than this is left out of the reply
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: usize,
}

fn default_feed_base_url() -> String {
    "https://api16-normal-c-useast1a.tiktokv.com".to_string()
}

const fn default_http_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "com.zhiliaoapp.musically/2022600030 (Linux; U; Android 7.1.2; es_ES; SM-G988N; Build/NRD90M;tt-ok/3.12.13.1)".to_string()
}

const fn default_max_attachment_bytes() -> usize {
    25 * 1024 * 1024
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// `DISCORD_BOT_TOKEN` is read from the process environment. Callers load
    /// `.env` with `dotenvy` beforehand, which never overrides variables that
    /// are already set, so the dotenv file only fills in a missing token.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the token is missing or empty.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            // UPPER_SNAKE_CASE variables map onto snake_case keys
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.discord_bot_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "DISCORD_BOT_TOKEN is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Deadline applied to each outbound HTTP request
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.tiktok_http_timeout_secs)
    }

    /// Settings with defaults for everything except the token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            discord_bot_token: token.into(),
            tiktok_feed_base_url: default_feed_base_url(),
            tiktok_http_timeout_secs: default_http_timeout_secs(),
            tiktok_user_agent: default_user_agent(),
            max_attachment_bytes: default_max_attachment_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Kept in a single test to avoid environment variable races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Token and override from the environment
        env::set_var("DISCORD_BOT_TOKEN", "dummy_token");
        env::set_var("TIKTOK_HTTP_TIMEOUT_SECS", "5");

        let settings = Settings::new()?;
        assert_eq!(settings.discord_bot_token, "dummy_token");
        assert_eq!(settings.http_timeout(), Duration::from_secs(5));
        assert_eq!(
            settings.tiktok_feed_base_url,
            "https://api16-normal-c-useast1a.tiktokv.com"
        );

        env::remove_var("TIKTOK_HTTP_TIMEOUT_SECS");

        // 2. Empty token is rejected
        env::set_var("DISCORD_BOT_TOKEN", "");
        assert!(Settings::new().is_err());

        // 3. Missing token is rejected
        env::remove_var("DISCORD_BOT_TOKEN");
        assert!(Settings::new().is_err());
        Ok(())
    }

    #[test]
    fn test_with_token_defaults() {
        let settings = Settings::with_token("abc");
        assert_eq!(settings.discord_bot_token, "abc");
        assert_eq!(settings.tiktok_http_timeout_secs, 30);
        assert_eq!(settings.max_attachment_bytes, 25 * 1024 * 1024);
        assert!(settings.validate().is_ok());
    }
}
