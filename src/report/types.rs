use crate::command::{Action, Category, Command, CommandStatus, UseCase};
use crate::widget::{ConcreteNode, WidgetDescriptor};
use serde::{Deserialize, Serialize};

/// One result record, written when a command reaches a terminal state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRecord {
    /// Milliseconds between RUNNING and the terminal state
    pub duration: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: CommandStatus,
    #[serde(flatten)]
    pub details: RecordDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Variant-specific record fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordDetails {
    #[serde(rename_all = "camelCase")]
    Locatable {
        target_widget: WidgetDescriptor,
        acted_widget: Option<ConcreteNode>,
        locating_attempts: u32,
        acting_attempts: u32,
    },
    #[serde(rename_all = "camelCase")]
    Navigational {
        navigated_widget: Option<ConcreteNode>,
    },
    #[serde(rename_all = "camelCase")]
    Info {
        question: String,
        answer: Option<serde_json::Value>,
    },
    Plain {},
}

impl CommandRecord {
    /// Placeholder for input that never became a command
    pub fn unrecognized(error: String) -> Self {
        Self {
            duration: 0,
            kind: "unknown".to_string(),
            state: CommandStatus::Failed,
            details: RecordDetails::Plain {},
            error: Some(error),
        }
    }
}

impl From<&Command> for CommandRecord {
    fn from(command: &Command) -> Self {
        let action = command.action();
        let details = match action {
            Action::Info { question, .. } => RecordDetails::Info {
                question: question.clone(),
                answer: command.answer.clone(),
            },
            _ => match (command.category(), action.target()) {
                (Category::Locatable, Some(target)) => RecordDetails::Locatable {
                    target_widget: target.clone(),
                    acted_widget: command.acted_widget.clone(),
                    locating_attempts: command.attempts.locating,
                    acting_attempts: command.attempts.acting,
                },
                (Category::Navigational, _) => RecordDetails::Navigational {
                    navigated_widget: command.navigated_widget.clone(),
                },
                _ => RecordDetails::Plain {},
            },
        };

        Self {
            duration: command.lifecycle().duration_ms(),
            kind: action.name().to_string(),
            state: command.status(),
            details,
            error: command.error.clone(),
        }
    }
}

/// The subset of a record needed to rebuild a report from a results file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    #[serde(default)]
    pub duration: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: CommandStatus,
    #[serde(default)]
    pub locating_attempts: u32,
    #[serde(default)]
    pub acting_attempts: u32,
    #[serde(default)]
    pub acted_widget: Option<ConcreteNode>,
    #[serde(default)]
    pub navigated_widget: Option<ConcreteNode>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One line of the aggregate report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSummary {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: CommandStatus,
    pub events: u32,
    pub duration_ms: u64,
    pub acting_widget: Option<String>,
    pub error: Option<String>,
}

impl From<(usize, &Command)> for StepSummary {
    fn from((index, command): (usize, &Command)) -> Self {
        Self {
            index,
            kind: command.action().name().to_string(),
            state: command.status(),
            events: command.attempts.total(),
            duration_ms: command.lifecycle().duration_ms(),
            acting_widget: command
                .acted_widget
                .as_ref()
                .or(command.navigated_widget.as_ref())
                .map(ConcreteNode::describe),
            error: command.error.clone(),
        }
    }
}

impl From<(usize, &RecordSummary)> for StepSummary {
    fn from((index, record): (usize, &RecordSummary)) -> Self {
        Self {
            index,
            kind: record.kind.clone(),
            state: record.state,
            events: record.locating_attempts + record.acting_attempts,
            duration_ms: record.duration,
            acting_widget: record
                .acted_widget
                .as_ref()
                .or(record.navigated_widget.as_ref())
                .map(ConcreteNode::describe),
            error: record.error.clone(),
        }
    }
}

/// Totals over a use case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub steps: usize,
    /// Completed with or without help
    pub completed: usize,
    /// FAILED_PERFORM and FAILED
    pub failed: usize,
    /// FAILED_LOCATE
    pub unlocatable: usize,
    /// First step not strictly COMPLETED, -1 when there is none
    pub first_problem: i64,
    pub total_events: u32,
    pub total_time_ms: u64,
}

/// Aggregate result of one use case
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseReport {
    pub name: String,
    pub steps: Vec<StepSummary>,
    pub total_time_ms: u64,
}

impl UseCaseReport {
    pub fn from_use_case(use_case: &UseCase, total_time_ms: u64) -> Self {
        Self {
            name: use_case.name().to_string(),
            steps: use_case
                .commands()
                .iter()
                .enumerate()
                .map(StepSummary::from)
                .collect(),
            total_time_ms,
        }
    }

    /// Rebuild from a results file; total time is the sum of step durations
    pub fn from_records(name: &str, records: &[RecordSummary]) -> Self {
        let steps: Vec<StepSummary> = records.iter().enumerate().map(StepSummary::from).collect();
        let total_time_ms = steps.iter().map(|s| s.duration_ms).sum();
        Self {
            name: name.to_string(),
            steps,
            total_time_ms,
        }
    }

    pub fn summary(&self) -> Summary {
        let count = |pred: fn(&CommandStatus) -> bool| {
            self.steps.iter().filter(|s| pred(&s.state)).count()
        };
        Summary {
            steps: self.steps.len(),
            completed: count(CommandStatus::is_success),
            failed: count(|s| matches!(s, CommandStatus::FailedPerform | CommandStatus::Failed)),
            unlocatable: count(|s| *s == CommandStatus::FailedLocate),
            first_problem: self
                .steps
                .iter()
                .position(|s| s.state != CommandStatus::Completed)
                .map_or(-1, |i| i as i64),
            total_events: self.steps.iter().map(|s| s.events).sum(),
            total_time_ms: self.total_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_success())
    }
}
