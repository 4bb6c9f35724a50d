//! Step executors advance the current command of a use case by one tick.

use super::context::ExecutionContext;
use super::controller::Controller;
use super::events::EngineEvent;
use crate::command::{Category, Command, CommandStatus};
use crate::error::EngineError;
use crate::strategy::{ActionPerformer, InteractionMode, ScreenReaderPerformer};
use crate::widget::Fingerprint;
use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Which step executor the use-case executor runs
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum StepStrategy {
    /// Hand each command to the controller
    #[default]
    Direct,
    /// Walk accessibility focus one node per tick, escalating when stuck
    ScreenReader,
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Advance `command` (at `index` in its use case) by one tick
    async fn step(&mut self, index: usize, command: &mut Command);

    /// Forget per-command state, called when a new use case starts
    fn reset(&mut self) {}
}

/// Runs the whole command through a controller in one tick
pub struct DirectStep {
    controller: Arc<Controller>,
}

impl DirectStep {
    pub fn new(controller: Arc<Controller>) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl StepExecutor for DirectStep {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn step(&mut self, _index: usize, command: &mut Command) {
        self.controller.drive(command).await;
    }
}

/// Sequential screen-reader search.
///
/// Each tick looks at the focused node: if it is the target, act on it; otherwise swipe
/// to the next node. A tally of visits per focused node (by fingerprint) and the acting
/// attempt counter detect a search that is going in circles, at which point the command
/// is handed to direct addressing.
pub struct ScreenReaderStep {
    ctx: Arc<ExecutionContext>,
    fallback: Arc<Controller>,
    performer: ScreenReaderPerformer,
    current: Option<usize>,
    visits: HashMap<Fingerprint, u32>,
    no_focus_ticks: u32,
    nudged: bool,
}

impl ScreenReaderStep {
    /// `fallback` must be a direct-addressing controller
    pub fn new(ctx: Arc<ExecutionContext>, fallback: Arc<Controller>) -> Self {
        let performer = ScreenReaderPerformer::new(ctx.matcher.clone());
        Self {
            ctx,
            fallback,
            performer,
            current: None,
            visits: HashMap::new(),
            no_focus_ticks: 0,
            nudged: false,
        }
    }

    fn clear_tally(&mut self) {
        self.visits.clear();
        self.no_focus_ticks = 0;
        self.nudged = false;
    }

    /// Hand the command to direct addressing. Success becomes COMPLETED_BY_HELP.
    async fn escalate(&mut self, index: usize, command: &mut Command, reason: String) {
        warn!("Step {} escalated to direct addressing: {}", index, reason);
        self.ctx
            .events
            .emit(EngineEvent::CommandEscalated { index, reason });

        self.fallback.drive(command).await;
        match command.status() {
            CommandStatus::Completed => {
                command.set_status(CommandStatus::CompletedByHelp);
            }
            status if status.is_terminal() => {
                command.set_status(CommandStatus::Failed);
            }
            // Interrupted, retried on the next tick
            _ => {}
        }
    }

    async fn seek(&mut self, index: usize, command: &mut Command) {
        let focused = match self.ctx.matcher.focused().await {
            Ok(focused) => focused,
            Err(e) => {
                warn!("Could not read focus: {:#}", e);
                return;
            }
        };

        let Some(focused) = focused else {
            self.wait_for_focus(command).await;
            return;
        };
        self.no_focus_ticks = 0;

        command.attempts.acting += 1;
        let visits = self.visits.entry(focused.xpath.clone()).or_insert(0);
        *visits += 1;
        let visits = *visits;

        let max_visits = self.ctx.config.max_visits_per_node;
        let max_acting = self.ctx.config.max_acting_attempts;
        if visits > max_visits {
            let reason = format!("focus stayed on {} for {} ticks", focused.xpath, visits);
            self.escalate(index, command, reason).await;
            return;
        }
        if command.attempts.acting > max_acting {
            let reason = format!("{} acting attempts", command.attempts.acting);
            self.escalate(index, command, reason).await;
            return;
        }

        let Some(target) = command.action().target() else {
            return;
        };
        let candidates = match self.ctx.matcher.find_candidates(target).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Could not match {}: {:#}", target, e);
                return;
            }
        };

        match candidates.as_slice() {
            [only] if only.is_same_node(&focused) => {
                let node = only.clone();
                match self.performer.execute(command.action(), &node).await {
                    Ok(()) => {
                        command.acted_widget = Some(node);
                        command.set_status(CommandStatus::Completed);
                    }
                    Err(e) => command.fail(CommandStatus::FailedPerform, &e),
                }
            }
            _ => {
                debug!(
                    "Focus on {}, {} candidate(s) for {}: moving on",
                    focused.xpath,
                    candidates.len(),
                    target
                );
                if let Err(e) = self.performer.navigate_next().await {
                    warn!("Swipe failed: {}", e);
                }
            }
        }
    }

    /// Nothing holds focus: wait, nudge once, wait again, then give up
    async fn wait_for_focus(&mut self, command: &mut Command) {
        self.no_focus_ticks += 1;
        let settle = self.ctx.config.focus_settle_ticks;

        if self.no_focus_ticks > settle.saturating_mul(2) {
            command.fail(
                CommandStatus::Failed,
                &EngineError::NotFound("no node ever received accessibility focus".into()),
            );
        } else if self.no_focus_ticks >= settle && !self.nudged {
            self.nudged = true;
            debug!("No focus after {} ticks, nudging forward", self.no_focus_ticks);
            if let Err(e) = self.performer.navigate_next().await {
                warn!("Nudge failed: {}", e);
            }
        }
    }
}

#[async_trait]
impl StepExecutor for ScreenReaderStep {
    fn name(&self) -> &'static str {
        "screen-reader"
    }

    async fn step(&mut self, index: usize, command: &mut Command) {
        if self.current != Some(index) {
            self.current = Some(index);
            self.clear_tally();
        }

        if command.skip() {
            self.fallback.drive(command).await;
            return;
        }

        command.set_status(CommandStatus::Running);
        match command.category() {
            Category::Locatable => self.seek(index, command).await,
            Category::Navigational => match self.performer.navigate(command.action()).await {
                Ok(focused) => {
                    command.navigated_widget = focused;
                    command.set_status(CommandStatus::Completed);
                }
                Err(e) => command.fail(CommandStatus::FailedPerform, &e),
            },
            Category::Info | Category::Sleep => self.fallback.drive(command).await,
        }
    }

    fn reset(&mut self) {
        self.current = None;
        self.clear_tally();
    }
}

impl StepStrategy {
    /// Build the step executor; `controller` runs commands in the configured mode
    pub fn build(
        self,
        ctx: &Arc<ExecutionContext>,
        controller: &Arc<Controller>,
    ) -> (Box<dyn StepExecutor>, Option<Arc<Controller>>) {
        match self {
            StepStrategy::Direct => (Box::new(DirectStep::new(controller.clone())), None),
            StepStrategy::ScreenReader => {
                let fallback = Arc::new(Controller::new(
                    ctx.clone(),
                    InteractionMode::AccessibilityApi,
                ));
                (
                    Box::new(ScreenReaderStep::new(ctx.clone(), fallback.clone())),
                    Some(fallback),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Action;
    use crate::driver::{DriverCall, NodeAction, ReplayDriver, SwipeDirection};
    use crate::report::MemorySink;
    use crate::utils::Config;
    use crate::widget::{Attribute, NodeHandle, WidgetDescriptor};

    const SCREEN: &str = r#"<hierarchy>
  <node class="Frame" bounds="[0,0][1000,1000]">
    <node class="Text" text="Title" bounds="[0,0][1000,100]"/>
    <node class="Button" text="Cancel" clickable="true" bounds="[0,100][500,200]"/>
    <node class="Button" text="OK" clickable="true" bounds="[500,100][1000,200]"/>
  </node>
</hierarchy>"#;

    fn setup(config: Config) -> (Arc<ReplayDriver>, ScreenReaderStep) {
        let driver = Arc::new(ReplayDriver::from_xml(SCREEN).unwrap());
        let ctx = Arc::new(ExecutionContext::new(
            config,
            driver.clone(),
            Arc::new(MemorySink::new()),
        ));
        let fallback = Arc::new(Controller::new(ctx.clone(), InteractionMode::AccessibilityApi));
        (driver, ScreenReaderStep::new(ctx, fallback))
    }

    fn click(text: &str) -> Command {
        Command::new(Action::Click(
            WidgetDescriptor::new()
                .with_text(text)
                .located_by(Attribute::Text),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_walks_focus_to_target_then_double_taps() {
        let (driver, mut step) = setup(Config::default());
        // Start with focus on the title
        driver.update(|tree| tree.set_accessibility_focus(Some(1)));
        let mut command = click("OK");

        for _ in 0..3 {
            step.step(0, &mut command).await;
        }
        assert_eq!(command.status(), CommandStatus::Completed);
        assert_eq!(command.attempts.acting, 3);
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Swipe(SwipeDirection::Right),
                DriverCall::Swipe(SwipeDirection::Right),
                DriverCall::DoubleTap
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_focus_escalates_to_completed_by_help() {
        let (driver, mut step) = setup(Config::default());
        driver.update(|tree| tree.set_accessibility_focus(Some(1)));
        driver.set_frozen_focus(true);
        let mut command = click("OK");

        for tick in 1..=4 {
            step.step(0, &mut command).await;
            assert_eq!(command.status(), CommandStatus::Running, "tick {}", tick);
        }
        // Fifth visit of the same node exceeds the bound of 4
        step.step(0, &mut command).await;

        assert_eq!(command.status(), CommandStatus::CompletedByHelp);
        assert_eq!(
            driver.calls().last(),
            Some(&DriverCall::Action(NodeHandle(3), NodeAction::Click))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_escalation_is_failed() {
        let (driver, mut step) = setup(Config::default());
        driver.update(|tree| tree.set_accessibility_focus(Some(1)));
        driver.set_frozen_focus(true);
        let mut command = click("Nowhere");

        for _ in 0..5 {
            step.step(0, &mut command).await;
        }
        assert_eq!(command.status(), CommandStatus::Failed);
        assert_eq!(command.attempts.locating, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acting_attempt_bound_escalates() {
        let config = Config {
            max_acting_attempts: 2,
            ..Config::default()
        };
        let (driver, mut step) = setup(config);
        driver.update(|tree| tree.set_accessibility_focus(Some(1)));
        let mut command = click("Missing");
        // Visits spread over different nodes, so only the acting bound can trip
        for _ in 0..3 {
            step.step(0, &mut command).await;
        }
        assert_eq!(command.status(), CommandStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_focus_nudges_once_then_fails() {
        let (driver, mut step) = setup(Config {
            focus_settle_ticks: 2,
            ..Config::default()
        });
        driver.set_frozen_focus(true);
        let mut command = click("OK");

        for _ in 0..4 {
            step.step(0, &mut command).await;
        }
        assert_eq!(command.status(), CommandStatus::Running);
        assert_eq!(driver.calls(), vec![DriverCall::Swipe(SwipeDirection::Right)]);

        step.step(0, &mut command).await;
        assert_eq!(command.status(), CommandStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_delegates_and_keeps_state() {
        let (driver, mut step) = setup(Config::default());
        let mut command = click("OK").with_skip(true);
        step.step(0, &mut command).await;
        assert_eq!(command.status(), CommandStatus::Completed);
        assert_eq!(
            driver.calls(),
            vec![DriverCall::Action(NodeHandle(3), NodeAction::Click)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tally_resets_for_next_command() {
        let (driver, mut step) = setup(Config::default());
        driver.update(|tree| tree.set_accessibility_focus(Some(1)));
        driver.set_frozen_focus(true);

        let mut first = click("Missing");
        for _ in 0..3 {
            step.step(0, &mut first).await;
        }
        // Visits from the first command do not count against the second
        let mut second = click("Missing");
        for _ in 0..4 {
            step.step(1, &mut second).await;
        }
        assert_eq!(second.status(), CommandStatus::Running);
    }
}
