use super::context::ExecutionContext;
use super::info;
use crate::command::{Action, Category, Command, CommandStatus};
use crate::parser::parse_command;
use crate::report::CommandRecord;
use crate::strategy::{ActionPerformer, InteractionMode, LocateOutcome, Locator};
use log::{debug, warn};
use std::sync::Arc;

/// Drives single commands through one locator / action-performer pair
pub struct Controller {
    ctx: Arc<ExecutionContext>,
    mode: InteractionMode,
    locator: Locator,
    performer: Box<dyn ActionPerformer>,
}

impl Controller {
    pub fn new(ctx: Arc<ExecutionContext>, mode: InteractionMode) -> Self {
        let (locator, performer) = mode.build(&ctx.matcher, &ctx.config);
        Self {
            ctx,
            mode,
            locator,
            performer,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Parse and run one serialized command.
    ///
    /// Returns the written record, or `None` when the command was interrupted.
    pub async fn execute_command(&self, serialized: &str) -> Option<CommandRecord> {
        let mut command = match parse_command(serialized) {
            Ok(command) => command,
            Err(e) => {
                warn!("Rejected command: {}", e);
                let record = CommandRecord::unrecognized(e.to_string());
                self.ctx.write(&record);
                return Some(record);
            }
        };
        self.execute(&mut command).await
    }

    /// Run a command and write its record once it is terminal
    pub async fn execute(&self, command: &mut Command) -> Option<CommandRecord> {
        self.ctx.command_started(None, command);
        self.drive(command).await;
        command
            .is_terminal()
            .then(|| self.ctx.report(None, command))
    }

    /// Run a command without reporting it. An interrupted command is left RUNNING.
    pub(crate) async fn drive(&self, command: &mut Command) {
        command.set_status(CommandStatus::Running);

        match command.category() {
            Category::Sleep => {
                if let Action::Sleep(units) = command.action() {
                    tokio::time::sleep(self.ctx.config.sleep_duration(*units)).await;
                }
                command.set_status(CommandStatus::Completed);
            }
            Category::Locatable => self.locate_and_act(command).await,
            Category::Navigational => match self.performer.navigate(command.action()).await {
                Ok(focused) => {
                    command.navigated_widget = focused;
                    command.set_status(CommandStatus::Completed);
                }
                Err(e) => command.fail(CommandStatus::FailedPerform, &e),
            },
            Category::Info => {
                let Action::Info { question, extra } = command.action().clone() else {
                    return;
                };
                match info::answer(&self.ctx.matcher, &question, extra.as_deref()).await {
                    Ok(answer) => {
                        command.answer = Some(answer);
                        command.set_status(CommandStatus::Completed);
                    }
                    Err(e) => command.fail(CommandStatus::Failed, &e),
                }
            }
        }
    }

    async fn locate_and_act(&self, command: &mut Command) {
        let Some(target) = command.action().target().cloned() else {
            return;
        };

        let report = self.locator.locate(&target).await;
        command.attempts.locating += report.attempts;

        match report.outcome {
            LocateOutcome::Found(node) => {
                command.attempts.acting += 1;
                match self.performer.execute(command.action(), &node).await {
                    Ok(()) => {
                        command.acted_widget = Some(node);
                        command.set_status(CommandStatus::Completed);
                    }
                    Err(e) => {
                        warn!("[{}] {} failed: {}", self.mode, command.action(), e);
                        command.fail(CommandStatus::FailedPerform, &e);
                    }
                }
            }
            LocateOutcome::Failed(e) => {
                warn!("[{}] could not locate {}: {}", self.mode, target, e);
                command.fail(CommandStatus::FailedLocate, &e);
            }
            LocateOutcome::Cancelled => {
                debug!("Locating {} was interrupted", target);
            }
        }
    }

    /// Cancel the in-flight locate, if any
    pub fn interrupt(&self) {
        self.locator.interrupt();
    }
}
