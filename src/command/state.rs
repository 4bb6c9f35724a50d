use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Command execution status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatus {
    #[default]
    NotStarted,
    Running,
    Completed,
    /// Sequential navigation gave up and direct addressing finished the command
    CompletedByHelp,
    FailedLocate,
    FailedPerform,
    Failed,
}

impl CommandStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandStatus::NotStarted | CommandStatus::Running)
    }

    /// Completed, with or without help
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CommandStatus::Completed | CommandStatus::CompletedByHelp
        )
    }

    pub fn is_failure(&self) -> bool {
        self.is_terminal() && !self.is_success()
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandStatus::NotStarted => "NOT_STARTED",
            CommandStatus::Running => "RUNNING",
            CommandStatus::Completed => "COMPLETED",
            CommandStatus::CompletedByHelp => "COMPLETED_BY_HELP",
            CommandStatus::FailedLocate => "FAILED_LOCATE",
            CommandStatus::FailedPerform => "FAILED_PERFORM",
            CommandStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Status plus the timestamps of the first RUNNING and first terminal transition
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    status: CommandStatus,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
}

impl Lifecycle {
    pub fn status(&self) -> CommandStatus {
        self.status
    }

    /// Apply a transition. Returns false when it is not allowed: nothing leaves a
    /// terminal state except towards another terminal state.
    pub fn set(&mut self, status: CommandStatus) -> bool {
        if self.status.is_terminal() && !status.is_terminal() {
            return false;
        }

        let now = Instant::now();
        if status == CommandStatus::Running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if status.is_terminal() {
            // A command that finishes without ever running still gets a zero-length span
            self.started_at.get_or_insert(now);
            self.finished_at.get_or_insert(now);
        }
        self.status = status;
        true
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    pub fn duration_ms(&self) -> u64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start).as_millis() as u64,
            (Some(start), None) => start.elapsed().as_millis() as u64,
            _ => 0,
        }
    }
}

/// Independent retry counters of a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attempts {
    pub locating: u32,
    pub acting: u32,
}

impl Attempts {
    /// Events counted by the text report
    pub fn total(&self) -> u32 {
        self.locating + self.acting
    }
}
