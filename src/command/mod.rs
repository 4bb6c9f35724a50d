//! Command model: one scripted action, its state machine and its retry counters,
//! plus the use case that sequences commands behind a single cursor.

pub mod state;

pub use state::{Attempts, CommandStatus, Lifecycle};

use crate::error::EngineError;
use crate::widget::{ConcreteNode, WidgetDescriptor};
use std::fmt;

/// What a command does
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Wait for a number of sleep units (seconds unless configured otherwise)
    Sleep(u64),
    Click(WidgetDescriptor),
    Type {
        target: WidgetDescriptor,
        text: String,
    },
    Focus(WidgetDescriptor),
    Back,
    Next,
    Previous,
    JumpNext,
    JumpPrevious,
    Select,
    Info {
        question: String,
        extra: Option<String>,
    },
}

/// How the controller dispatches a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Locatable,
    Navigational,
    Info,
    Sleep,
}

impl Action {
    /// Serialized action name
    pub fn name(&self) -> &'static str {
        match self {
            Action::Sleep(_) => "sleep",
            Action::Click(_) => "click",
            Action::Type { .. } => "type",
            Action::Focus(_) => "focus",
            Action::Back => "back",
            Action::Next => "next",
            Action::Previous => "previous",
            Action::JumpNext => "jump_next",
            Action::JumpPrevious => "jump_previous",
            Action::Select => "select",
            Action::Info { .. } => "info",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Action::Click(_) | Action::Type { .. } | Action::Focus(_) => Category::Locatable,
            Action::Back
            | Action::Next
            | Action::Previous
            | Action::JumpNext
            | Action::JumpPrevious
            | Action::Select => Category::Navigational,
            Action::Info { .. } => Category::Info,
            Action::Sleep(_) => Category::Sleep,
        }
    }

    pub fn target(&self) -> Option<&WidgetDescriptor> {
        match self {
            Action::Click(target) | Action::Focus(target) | Action::Type { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Sleep(units) => write!(f, "sleep {}", units),
            Action::Type { target, text } => write!(f, "type \"{}\" into {}", text, target),
            Action::Info { question, .. } => write!(f, "info {}", question),
            other => match other.target() {
                Some(target) => write!(f, "{} {}", other.name(), target),
                None => f.write_str(other.name()),
            },
        }
    }
}

/// One scripted action and everything recorded while running it
#[derive(Debug, Clone)]
pub struct Command {
    action: Action,
    skip: bool,
    lifecycle: Lifecycle,
    pub attempts: Attempts,
    /// Last node the command acted on
    pub acted_widget: Option<ConcreteNode>,
    /// Node holding focus after a navigation
    pub navigated_widget: Option<ConcreteNode>,
    /// Payload of an info query
    pub answer: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl Command {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            skip: false,
            lifecycle: Lifecycle::default(),
            attempts: Attempts::default(),
            acted_widget: None,
            navigated_widget: None,
            answer: None,
            error: None,
        }
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn category(&self) -> Category {
        self.action.category()
    }

    /// Should be delegated rather than executed directly
    pub fn skip(&self) -> bool {
        self.skip
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn status(&self) -> CommandStatus {
        self.lifecycle.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn set_status(&mut self, status: CommandStatus) -> bool {
        self.lifecycle.set(status)
    }

    /// Enter a terminal status and remember why
    pub fn fail(&mut self, status: CommandStatus, error: &EngineError) {
        self.error = Some(error.to_string());
        self.set_status(status);
    }
}

/// Ordered commands executed as one unit behind a single cursor.
///
/// The cursor only moves forward, and only past commands that are already terminal.
#[derive(Debug, Clone)]
pub struct UseCase {
    name: String,
    commands: Vec<Command>,
    cursor: usize,
}

impl UseCase {
    pub fn new(name: impl Into<String>, commands: Vec<Command>) -> Self {
        Self {
            name: name.into(),
            commands,
            cursor: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn advance(&mut self) {
        while self
            .commands
            .get(self.cursor)
            .is_some_and(Command::is_terminal)
        {
            self.cursor += 1;
        }
    }

    pub fn is_finished(&mut self) -> bool {
        self.advance();
        self.cursor >= self.commands.len()
    }

    /// Current command after skipping every terminal one, with its index
    pub fn current(&mut self) -> Option<(usize, &mut Command)> {
        self.advance();
        let index = self.cursor;
        self.commands.get_mut(index).map(|command| (index, command))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Command> {
        self.commands.get_mut(index)
    }
}
