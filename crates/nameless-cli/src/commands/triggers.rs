use clap::Subcommand;
use std::sync::Arc;
use tracing::info;

use nameless_config::Settings;
use nameless_runtime::NamelessAgent;
use nameless_triggers::{BlueskyTrigger, DiscordTrigger, PerchTrigger, perch_interval};

#[derive(Subcommand)]
pub(super) enum BlueskyAction {
    /// Check notifications once, handle mentions, mark them seen
    Poll,
    /// List unread notifications
    Notifications,
    /// Publish a post (truncated to 300 characters)
    Post { text: String },
    /// Show a post and its thread as JSON
    Thread { uri: String },
}

pub(super) async fn cmd_perch(
    settings: Arc<Settings>,
    interval_hours: Option<u64>,
    once: bool,
) -> nameless_core::Result<()> {
    let interval = interval_hours.map(perch_interval).transpose()?;
    let agent = Arc::new(NamelessAgent::from_settings(settings)?);
    let mut trigger = PerchTrigger::new(agent);
    if let Some(interval) = interval {
        trigger = trigger.with_interval(interval);
    }

    if once {
        trigger.perch_time().await;
        return Ok(());
    }

    println!(
        "Perch time every {}h. Press Ctrl+C to stop.",
        trigger.interval().as_secs() / 3600
    );
    let handle = trigger.start();
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    handle.stop().await;
    Ok(())
}

pub(super) async fn cmd_bluesky(
    settings: &Settings,
    action: BlueskyAction,
) -> nameless_core::Result<()> {
    let trigger = BlueskyTrigger::from_settings(settings);
    match action {
        BlueskyAction::Poll => {
            let count = trigger.poll_and_respond().await?;
            println!("Processed {count} notifications");
        }
        BlueskyAction::Notifications => {
            let notifications = trigger.check_notifications().await?;
            if notifications.is_empty() {
                println!("No unread notifications.");
            }
            for n in &notifications {
                println!("{}  {:<8} @{}  {}", n.indexed_at, n.reason, n.author, n.uri);
            }
        }
        BlueskyAction::Post { text } => {
            let uri = trigger.post(&text).await?;
            println!("Posted: {uri}");
        }
        BlueskyAction::Thread { uri } => {
            let thread = trigger.get_post_thread(&uri).await?;
            println!("{}", serde_json::to_string_pretty(&thread)?);
        }
    }
    Ok(())
}

pub(super) fn cmd_discord(settings: Arc<Settings>) -> nameless_core::Result<()> {
    DiscordTrigger::new(settings).start()
}
