use std::sync::Arc;

use nameless_config::Settings;
use nameless_core::{NamelessError, truncate_chars};
use nameless_runtime::{AgentEvent, run_agent};

pub(super) async fn cmd_chat(
    settings: Arc<Settings>,
    message: &str,
    agent_id: Option<String>,
    system_prompt: Option<String>,
) -> nameless_core::Result<()> {
    let events = run_agent(settings, message, agent_id, system_prompt).await?;

    for event in events {
        match event {
            AgentEvent::Text { text } => println!("\x1b[32mnameless>\x1b[0m {text}"),
            AgentEvent::ToolUse { name, input, .. } => {
                eprintln!("\x1b[90m  tool {name} {}\x1b[0m", truncate_chars(&input.to_string(), 120));
            }
            AgentEvent::ToolResult {
                content, is_error, ..
            } => {
                let color = if is_error { "\x1b[31m" } else { "\x1b[90m" };
                eprintln!("{color}  -> {}\x1b[0m", truncate_chars(&content, 120));
            }
            AgentEvent::Result {
                stop_reason,
                iterations,
                usage,
            } => {
                eprintln!(
                    "\x1b[90m  ({stop_reason:?}, {iterations} turns, {} tokens)\x1b[0m",
                    usage.total_tokens()
                );
            }
            AgentEvent::Error { message } => return Err(NamelessError::LlmProvider(message)),
        }
    }
    Ok(())
}
