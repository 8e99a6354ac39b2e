use nameless_core::{NamelessError, Result, truncate_chars};
use nameless_runtime::{AgentEvent, NamelessAgent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info};

/// The fixed prompt for a perch-time reflection cycle.
pub const PERCH_TIME_PROMPT: &str = "It's perch time - a moment for autonomous reflection.

First, use your memory tools to:
1. List your memory blocks to see what context is available
2. Get your persona block to remember who you are
3. Search archival memory for recent experiences
4. Review recent messages if any conversations happened

Then reflect on:
- What have you learned recently?
- How has your understanding evolved?
- Is there anything worth archiving from recent experiences?
- Do you want to reach out to anyone?

Take your time. This is your moment for self-directed thought.";

/// How often the loop checks whether a cycle is due.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

const LOG_PREVIEW_CHARS: usize = 200;

const SECS_PER_HOUR: u64 = 3600;

/// Convert a user-supplied hour count into a perch interval.
///
/// Zero and counts too large to express in seconds are rejected.
pub fn perch_interval(hours: u64) -> Result<Duration> {
    if hours == 0 {
        return Err(NamelessError::ConfigValidation {
            field: "interval_hours".into(),
            reason: "must be at least 1".into(),
        });
    }
    hours
        .checked_mul(SECS_PER_HOUR)
        .map(Duration::from_secs)
        .ok_or_else(|| NamelessError::ConfigValidation {
            field: "interval_hours".into(),
            reason: format!("{hours} hours is out of range"),
        })
}

/// When the next cycle is due. The first check is always due.
#[derive(Debug, Clone)]
pub struct PerchSchedule {
    interval: Duration,
    last_run: Option<Instant>,
}

impl PerchSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark_run(&mut self, now: Instant) {
        self.last_run = Some(now);
    }
}

/// Periodic self-reflection. Runs a cycle on start, then every interval.
pub struct PerchTrigger {
    agent: Arc<NamelessAgent>,
    interval: Duration,
    poll_interval: Duration,
}

impl PerchTrigger {
    /// Interval taken from `triggers.perch_interval_hours`.
    pub fn new(agent: Arc<NamelessAgent>) -> Self {
        let hours = agent.settings().triggers.perch_interval_hours;
        Self {
            agent,
            interval: Duration::from_secs(hours.saturating_mul(SECS_PER_HOUR)),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll_interval = poll;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One reflection cycle. Failures are logged, never returned.
    ///
    /// Returns the number of text responses produced.
    pub async fn perch_time(&self) -> usize {
        info!(at = %chrono::Local::now().to_rfc3339(), "perch time triggered");

        let events = match self.agent.run_and_collect(PERCH_TIME_PROMPT).await {
            Ok(events) => events,
            Err(e) => {
                error!(error = %e, "perch time cycle failed");
                return 0;
            }
        };

        let mut texts = 0;
        for event in &events {
            match event {
                AgentEvent::Text { text } => {
                    texts += 1;
                    info!("Nameless: {}...", truncate_chars(text, LOG_PREVIEW_CHARS));
                }
                AgentEvent::Error { message } => {
                    error!(error = %message, "perch time cycle failed");
                }
                _ => {}
            }
        }

        info!("perch time cycle complete");
        texts
    }

    /// Run until `stop` flips to true or its sender is dropped.
    ///
    /// A long cycle delays the next check; cycles never overlap.
    pub async fn run(self, mut stop: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "starting perch time scheduler"
        );
        let mut schedule = PerchSchedule::new(self.interval);

        loop {
            if *stop.borrow() {
                break;
            }

            let now = Instant::now();
            if schedule.is_due(now) {
                schedule.mark_run(now);
                self.perch_time().await;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        info!("perch time scheduler stopped");
    }

    /// Spawn the loop onto the runtime.
    pub fn start(self) -> PerchHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(stop_rx));
        PerchHandle { stop_tx, task }
    }
}

/// Handle to a running perch loop.
pub struct PerchHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PerchHandle {
    /// Signal the loop to stop and wait for it. An in-flight cycle finishes first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
