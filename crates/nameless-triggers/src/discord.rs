use nameless_config::Settings;
use nameless_core::{NamelessError, Result, truncate_chars};
use std::sync::Arc;
use tracing::info;

/// Reply to every direct mention until responses are generated by the agent.
pub const WAKING_UP_REPLY: &str = "I'm still waking up... my memory system is being configured.";

/// Discord message-event handlers.
///
/// There is no gateway connection; `start` only checks configuration.
pub struct DiscordTrigger {
    settings: Arc<Settings>,
}

impl DiscordTrigger {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Handle an incoming message. Returns the reply to send, if any.
    pub async fn on_message(&self, content: &str, author: &str, channel: &str) -> Option<String> {
        info!(
            author,
            channel,
            "Discord message: {}...",
            truncate_chars(content, 50)
        );
        None
    }

    /// Handle a direct mention. Mentions are always answered.
    pub async fn on_mention(&self, _content: &str, author: &str, channel: &str) -> String {
        info!(author, channel, "Discord mention");
        WAKING_UP_REPLY.to_string()
    }

    pub fn start(&self) -> Result<()> {
        if self
            .settings
            .discord
            .bot_token
            .as_deref()
            .is_none_or(str::is_empty)
        {
            return Err(NamelessError::Config("DISCORD_BOT_TOKEN not configured".into()));
        }
        info!(guild = ?self.settings.discord.guild_id, "Discord trigger not yet implemented");
        Ok(())
    }
}
