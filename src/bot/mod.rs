/// Reply to serenity builder conversion
pub mod discord;
/// Discord event and slash command handlers
pub mod handlers;
/// Link-to-reply resolution
pub mod pipeline;
/// Platform-neutral reply composition
pub mod reply;

pub use handlers::Handler;
