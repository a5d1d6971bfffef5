use anyhow::Context;
use dotenvy::dotenv;
use gothik_bot::bot::Handler;
use gothik_bot::config::Settings;
use gothik_bot::tiktok::{TiktokApi, TiktokClient};
use regex::Regex;
use serenity::all::{Client, Command, CommandId, GatewayIntents};
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    token: Regex,
    auth_header: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token: Regex::new(r"[A-Za-z0-9_-]{24,}\.[A-Za-z0-9_-]{6}\.[A-Za-z0-9_-]{27,}")?,
            auth_header: Regex::new(r"(?i)(authorization:\s*bot\s+)\S+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let output = self.auth_header.replace_all(input, "$1[DISCORD_TOKEN]");
        self.token
            .replace_all(&output, "[DISCORD_TOKEN]")
            .to_string()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length even though the redacted one may differ
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Only fills in variables that are not already set
    dotenv().ok();

    let patterns = Arc::new(
        RedactionPatterns::new().context("Failed to compile redaction patterns")?,
    );
    init_logging(patterns);

    info!("Starting Gothik Discord bot...");

    let settings = init_settings();
    let api = init_tiktok_client(&settings);

    let command_id = Arc::new(OnceLock::new());
    let handler = Handler::new(api, settings.clone(), command_id.clone());

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match Client::builder(&settings.discord_bot_token, intents)
        .event_handler(handler)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Couldn't initialize Discord bot: {}", e);
            std::process::exit(1);
        }
    };

    let shard_manager = client.shard_manager.clone();
    let http = client.http.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for interrupt signal: {}", e);
        }
        info!("Removing command");
        if let Some(id) = command_id.get() {
            remove_command(&http, *id).await;
        }
        shard_manager.shutdown_all().await;
    });

    info!("Press Ctrl+C to exit");
    if let Err(e) = client.start().await {
        error!("Couldn't open session: {}", e);
        std::process::exit(1);
    }

    info!("Session closed");
    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Couldn't get DISCORD_BOT_TOKEN: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tiktok_client(settings: &Settings) -> Arc<dyn TiktokApi> {
    match TiktokClient::new(settings) {
        Ok(client) => {
            info!(
                feed = %settings.tiktok_feed_base_url,
                timeout_secs = settings.tiktok_http_timeout_secs,
                "TikTok client initialized."
            );
            Arc::new(client)
        }
        Err(e) => {
            error!("Failed to initialize TikTok client: {}", e);
            std::process::exit(1);
        }
    }
}

async fn remove_command(http: &serenity::http::Http, id: CommandId) {
    if let Err(e) = Command::delete_global_command(http, id).await {
        warn!("Couldn't remove command: {}", e);
    }
}
