use crate::command::CommandStatus;
use crate::report::Summary;
use tokio::sync::broadcast;

/// Execution events for real-time updates
#[derive(Debug, Clone)]
pub enum EngineEvent {
    UseCaseStarted {
        name: String,
        command_count: usize,
    },
    UseCaseFinished {
        name: String,
        summary: Summary,
    },

    /// `index` is the position in the use case, `None` for single commands
    CommandStarted {
        index: Option<usize>,
        command: String,
    },
    CommandFinished {
        index: Option<usize>,
        state: CommandStatus,
        duration_ms: u64,
        error: Option<String>,
    },
    /// Sequential navigation gave up and handed the command to direct addressing
    CommandEscalated {
        index: usize,
        reason: String,
    },
}

/// Event emitter for broadcasting execution events
pub struct EventEmitter {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventEmitter {
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    fn label(index: Option<usize>) -> String {
        index.map_or_else(|| "[-]".to_string(), |i| format!("[{}]", i))
    }

    pub async fn listen(mut receiver: broadcast::Receiver<EngineEvent>) {
        use colored::Colorize;
        use std::io::IsTerminal;

        let is_tty = std::io::stdout().is_terminal();
        let mut spinner: Option<ProgressBar> = None;
        let mut command_text = String::new();

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                EngineEvent::UseCaseStarted {
                    name,
                    command_count,
                } => {
                    println!(
                        "\n  {} Use case: {} ({} commands)",
                        "→".blue(),
                        name.white().bold(),
                        command_count
                    );
                }

                EngineEvent::UseCaseFinished { name, summary } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    let status = if summary.completed == summary.steps {
                        "PASSED".green().bold()
                    } else {
                        "FAILED".red().bold()
                    };
                    println!("  {} Use case {} [{}]", "←".blue(), name, status);
                    println!(
                        "    {} completed, {} failed, {} unlocatable, {} events, {}ms",
                        summary.completed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.unlocatable.to_string().yellow(),
                        summary.total_events,
                        summary.total_time_ms
                    );
                }

                EngineEvent::CommandStarted { index, command } => {
                    let pb = ProgressBar::new_spinner();
                    if !is_tty {
                        // Piped output: no escape codes
                        pb.set_draw_target(ProgressDrawTarget::hidden());
                    }
                    if let Ok(style) = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("    {spinner} {msg}")
                    {
                        pb.set_style(style);
                    }
                    command_text = format!("{} {}... ", Self::label(index), command.dimmed());
                    pb.set_message(command_text.clone());
                    pb.enable_steady_tick(StdDuration::from_millis(100));
                    spinner = Some(pb);
                }

                EngineEvent::CommandFinished {
                    state,
                    duration_ms,
                    error,
                    ..
                } => {
                    if let Some(pb) = spinner.take() {
                        pb.finish_and_clear();
                    }
                    let mark = match state {
                        CommandStatus::Completed => "✓".green(),
                        CommandStatus::CompletedByHelp => "✓".yellow(),
                        _ => "✗".red(),
                    };
                    println!(
                        "    {} {}{} ({}ms)",
                        mark,
                        command_text,
                        state.to_string().dimmed(),
                        duration_ms
                    );
                    if let Some(error) = error {
                        println!("      {}", error.red());
                    }
                }

                EngineEvent::CommandEscalated { index, reason } => {
                    let message = format!("↻ step {} escalated: {}", index, reason);
                    match &spinner {
                        Some(pb) => pb.set_message(format!("{}{}", command_text, message.yellow())),
                        None => println!("      {}", message.yellow()),
                    }
                }

            }
        }
    }
}
