//! # nameless-triggers
//!
//! Things that wake the agent up: the periodic perch-time reflection, the
//! Bluesky notification poller, and the Discord message handlers.

pub mod bluesky;
pub mod discord;
pub mod perch;

pub use bluesky::{BlueskyClient, BlueskyTrigger, Notification, truncate_post};
pub use discord::{DiscordTrigger, WAKING_UP_REPLY};
pub use perch::{PERCH_TIME_PROMPT, PerchHandle, PerchSchedule, PerchTrigger, perch_interval};
