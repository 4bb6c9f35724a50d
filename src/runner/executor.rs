//! Polling scheduler for use cases.
//!
//! A tick carries the enable id that was current when it was scheduled. Disabling or
//! re-enabling the executor makes every older tick, locate loop and sleep timer a no-op.
//! A step that only returns after a disable keeps its record until the next enable period.

use super::context::ExecutionContext;
use super::controller::Controller;
use super::events::EngineEvent;
use super::step::StepExecutor;
use crate::command::{Action, Command, CommandStatus, UseCase};
use crate::report::{CommandRecord, UseCaseReport};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorMode {
    Idle,
    Running,
    CustomStep,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick belongs to an earlier enable id
    Stale,
    Idle,
    /// The current command is still in progress
    Waiting,
    /// The current command reached a terminal state
    Progress,
    Finished(UseCaseReport),
    CustomDone(CommandRecord),
}

/// Where a sleeping command lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Step(usize),
    Custom,
}

impl Slot {
    fn index(self) -> Option<usize> {
        match self {
            Slot::Step(index) => Some(index),
            Slot::Custom => None,
        }
    }
}

/// Identity of one sleep timer. `serial` is unique per timer, so a timer left over
/// from replaced work never matches the sleep that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SleepTimer {
    slot: Slot,
    enable_id: u64,
    serial: u64,
}

impl SleepTimer {
    fn covers(&self, slot: Slot, enable_id: u64) -> bool {
        self.slot == slot && self.enable_id == enable_id
    }
}

struct ExecutorState {
    mode: ExecutorMode,
    use_case: Option<UseCase>,
    custom: Option<Command>,
    step: Box<dyn StepExecutor>,
    sleeping: Option<SleepTimer>,
    timer_serial: u64,
    /// Terminal command whose step returned after its enable period ended
    unreported: Option<Slot>,
    started_at: Instant,
}

impl ExecutorState {
    fn command_mut(&mut self, slot: Slot) -> Option<&mut Command> {
        match slot {
            Slot::Step(index) => self.use_case.as_mut().and_then(|u| u.get_mut(index)),
            Slot::Custom => self.custom.as_mut(),
        }
    }
}

pub struct UseCaseExecutor {
    ctx: Arc<ExecutionContext>,
    controllers: Vec<Arc<Controller>>,
    state: Arc<Mutex<ExecutorState>>,
    enable_id: Arc<AtomicU64>,
    sleeping: Arc<AtomicBool>,
}

impl UseCaseExecutor {
    pub fn new(ctx: Arc<ExecutionContext>) -> Self {
        let controller = Arc::new(Controller::new(ctx.clone(), ctx.config.mode));
        let (step, fallback) = ctx.config.step_executor.build(&ctx, &controller);
        info!(
            "Executor ready on {}: mode {}, step executor {}",
            ctx.driver().platform_name(),
            controller.mode(),
            step.name()
        );

        let mut controllers = vec![controller];
        controllers.extend(fallback);

        Self {
            ctx,
            controllers,
            state: Arc::new(Mutex::new(ExecutorState {
                mode: ExecutorMode::Idle,
                use_case: None,
                custom: None,
                step,
                sleeping: None,
                timer_serial: 0,
                unreported: None,
                started_at: Instant::now(),
            })),
            enable_id: Arc::new(AtomicU64::new(0)),
            sleeping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a new enable period and return its id
    pub fn enable(&self) -> u64 {
        let id = self.enable_id.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Executor enabled with id {}", id);
        id
    }

    /// Invalidate every outstanding tick and cancel in-flight locates
    pub fn disable(&self) {
        let previous = self.enable_id.fetch_add(1, Ordering::SeqCst);
        debug!("Executor disabled (id {} is now stale)", previous);
        self.sleeping.store(false, Ordering::SeqCst);
        for controller in &self.controllers {
            controller.interrupt();
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.enable_id.load(Ordering::SeqCst) == id
    }

    /// Whether a sleep command's timer is running. Ticks keep firing meanwhile.
    pub fn is_sleeping(&self) -> bool {
        self.sleeping.load(Ordering::SeqCst)
    }

    /// Load a use case and switch to RUNNING, replacing whatever was loaded
    pub async fn init(&self, use_case: UseCase) {
        let mut state = self.state.lock().await;
        if state.mode != ExecutorMode::Idle {
            warn!("Replacing unfinished work with use case {}", use_case.name());
        }
        self.ctx.events.emit(EngineEvent::UseCaseStarted {
            name: use_case.name().to_string(),
            command_count: use_case.len(),
        });
        state.step.reset();
        state.sleeping = None;
        state.unreported = None;
        state.custom = None;
        state.use_case = Some(use_case);
        state.started_at = Instant::now();
        state.mode = ExecutorMode::Running;
        self.sleeping.store(false, Ordering::SeqCst);
    }

    /// Queue one ad-hoc command. Refused unless the executor is idle.
    pub async fn execute_custom_step(&self, command: Command) -> bool {
        let mut state = self.state.lock().await;
        if state.mode != ExecutorMode::Idle {
            warn!("Executor busy, custom step {} refused", command.action());
            return false;
        }
        state.step.reset();
        state.sleeping = None;
        state.unreported = None;
        state.custom = Some(command);
        state.mode = ExecutorMode::CustomStep;
        true
    }

    pub async fn mode(&self) -> ExecutorMode {
        self.state.lock().await.mode
    }

    /// Cursor of the loaded use case
    pub async fn cursor(&self) -> Option<usize> {
        self.state.lock().await.use_case.as_ref().map(UseCase::cursor)
    }

    pub async fn command_status(&self, index: usize) -> Option<CommandStatus> {
        let state = self.state.lock().await;
        state
            .use_case
            .as_ref()
            .and_then(|u| u.commands().get(index))
            .map(Command::status)
    }

    /// Run one scheduler tick on behalf of enable period `id`
    pub async fn tick(&self, id: u64) -> TickOutcome {
        if !self.is_current(id) {
            return TickOutcome::Stale;
        }
        let mut guard = self.state.lock().await;
        // Disabled while waiting for the lock
        if !self.is_current(id) {
            return TickOutcome::Stale;
        }

        let state = &mut *guard;
        match state.mode {
            ExecutorMode::Idle => TickOutcome::Idle,
            ExecutorMode::Running => self.tick_use_case(state, id).await,
            ExecutorMode::CustomStep => self.tick_custom(state, id).await,
        }
    }

    async fn tick_use_case(&self, state: &mut ExecutorState, id: u64) -> TickOutcome {
        self.flush_unreported(state);
        let Some(use_case) = state.use_case.as_mut() else {
            state.mode = ExecutorMode::Idle;
            return TickOutcome::Idle;
        };
        if use_case.is_finished() {
            return self.finish(state);
        }
        let Some((index, command)) = use_case.current() else {
            return TickOutcome::Waiting;
        };

        if command.status() == CommandStatus::NotStarted {
            self.ctx.command_started(Some(index), command);
        }

        if let Action::Sleep(units) = command.action() {
            let slot = Slot::Step(index);
            if !state.sleeping.is_some_and(|t| t.covers(slot, id)) {
                let duration = self.ctx.config.sleep_duration(*units);
                command.set_status(CommandStatus::Running);
                state.timer_serial += 1;
                let timer = SleepTimer {
                    slot,
                    enable_id: id,
                    serial: state.timer_serial,
                };
                state.sleeping = Some(timer);
                self.start_timer(timer, duration);
            }
            return TickOutcome::Waiting;
        }

        state.step.step(index, command).await;
        if !command.is_terminal() {
            return TickOutcome::Waiting;
        }
        // Disabled while the step ran: hold the record back until the next enable period
        if !self.is_current(id) {
            state.unreported = Some(Slot::Step(index));
            return TickOutcome::Stale;
        }
        self.ctx.report(Some(index), command);
        TickOutcome::Progress
    }

    async fn tick_custom(&self, state: &mut ExecutorState, id: u64) -> TickOutcome {
        let flushed = self.flush_unreported(state);
        let Some(command) = state.custom.as_mut() else {
            state.mode = ExecutorMode::Idle;
            return TickOutcome::Idle;
        };

        // Either flushed just now or completed by its sleep timer, which wrote the record
        if command.is_terminal() {
            let record = flushed.unwrap_or_else(|| CommandRecord::from(&*command));
            state.custom = None;
            state.mode = ExecutorMode::Idle;
            return TickOutcome::CustomDone(record);
        }

        if command.status() == CommandStatus::NotStarted {
            self.ctx.command_started(None, command);
        }

        if let Action::Sleep(units) = command.action() {
            if !state.sleeping.is_some_and(|t| t.covers(Slot::Custom, id)) {
                let duration = self.ctx.config.sleep_duration(*units);
                command.set_status(CommandStatus::Running);
                state.timer_serial += 1;
                let timer = SleepTimer {
                    slot: Slot::Custom,
                    enable_id: id,
                    serial: state.timer_serial,
                };
                state.sleeping = Some(timer);
                self.start_timer(timer, duration);
            }
            return TickOutcome::Waiting;
        }

        state.step.step(0, command).await;
        if !command.is_terminal() {
            return TickOutcome::Waiting;
        }
        if !self.is_current(id) {
            state.unreported = Some(Slot::Custom);
            return TickOutcome::Stale;
        }
        let record = self.ctx.report(None, command);
        state.custom = None;
        state.mode = ExecutorMode::Idle;
        TickOutcome::CustomDone(record)
    }

    /// Write the record held back by a step that outlived its enable period
    fn flush_unreported(&self, state: &mut ExecutorState) -> Option<CommandRecord> {
        let slot = state.unreported.take()?;
        let command = state.command_mut(slot)?;
        Some(self.ctx.report(slot.index(), command))
    }

    /// One-shot timer that completes a sleep command without waiting for a tick
    fn start_timer(&self, timer: SleepTimer, duration: Duration) {
        debug!(
            "Sleeping {:?} for {}ms (timer {})",
            timer.slot,
            duration.as_millis(),
            timer.serial
        );
        self.sleeping.store(true, Ordering::SeqCst);

        let state = self.state.clone();
        let ctx = self.ctx.clone();
        let enable_id = self.enable_id.clone();
        let sleeping = self.sleeping.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if enable_id.load(Ordering::SeqCst) != timer.enable_id {
                return;
            }
            let mut state = state.lock().await;
            if enable_id.load(Ordering::SeqCst) != timer.enable_id
                || state.sleeping != Some(timer)
            {
                return;
            }
            state.sleeping = None;
            sleeping.store(false, Ordering::SeqCst);
            if let Some(command) = state.command_mut(timer.slot) {
                command.set_status(CommandStatus::Completed);
                ctx.report(timer.slot.index(), command);
            }
        });
    }

    fn finish(&self, state: &mut ExecutorState) -> TickOutcome {
        state.mode = ExecutorMode::Idle;
        let Some(use_case) = state.use_case.take() else {
            return TickOutcome::Idle;
        };

        let elapsed = state.started_at.elapsed().as_millis() as u64;
        let report = UseCaseReport::from_use_case(&use_case, elapsed);
        let summary = report.summary();
        info!(
            "Use case {} finished: {}/{} completed in {}ms",
            report.name, summary.completed, summary.steps, elapsed
        );
        if let Err(e) = self.ctx.sink.write_report(&report) {
            error!("Failed to write use case report: {:#}", e);
        }
        self.ctx.events.emit(EngineEvent::UseCaseFinished {
            name: report.name.clone(),
            summary,
        });
        TickOutcome::Finished(report)
    }

    /// Tick on the configured interval until the loaded work is done.
    ///
    /// Returns `None` when the executor is disabled first or has nothing loaded.
    pub async fn run_to_completion(&self, id: u64) -> Option<TickOutcome> {
        let mut interval = tokio::time::interval(self.ctx.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match self.tick(id).await {
                TickOutcome::Stale | TickOutcome::Idle => return None,
                outcome @ (TickOutcome::Finished(_) | TickOutcome::CustomDone(_)) => {
                    return Some(outcome)
                }
                TickOutcome::Waiting | TickOutcome::Progress => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, NodeAction, ReplayDriver};
    use crate::parser::parse_command;
    use crate::report::MemorySink;
    use crate::runner::step::StepStrategy;
    use crate::utils::Config;
    use crate::widget::NodeHandle;

    const SCREEN: &str = r#"<hierarchy>
  <node class="Frame" bounds="[0,0][1000,1000]">
    <node class="Text" text="Title" bounds="[0,0][1000,100]"/>
    <node class="Button" text="Cancel" clickable="true" bounds="[0,100][500,200]"/>
    <node class="Button" text="OK" clickable="true" bounds="[500,100][1000,200]"/>
    <node class="Edit" resource-id="app:id/name" clickable="true" bounds="[0,200][1000,300]"/>
  </node>
</hierarchy>"#;

    fn setup(config: Config) -> (Arc<ReplayDriver>, Arc<MemorySink>, UseCaseExecutor) {
        let driver = Arc::new(ReplayDriver::from_xml(SCREEN).unwrap());
        let sink = Arc::new(MemorySink::new());
        let ctx = Arc::new(ExecutionContext::new(config, driver.clone(), sink.clone()));
        (driver, sink, UseCaseExecutor::new(ctx))
    }

    fn use_case(commands: &[&str]) -> UseCase {
        UseCase::new(
            "sample",
            commands.iter().map(|c| parse_command(c).unwrap()).collect(),
        )
    }

    const CLICK_OK: &str = r#"{"action":"click","target":{"text":"OK","located_by":"text"}}"#;
    const SLEEP_2: &str = r#"{"action":"sleep","sleep":"2"}"#;
    const CLICK_MISSING: &str =
        r#"{"action":"click","target":{"text":"Missing","located_by":"text"}}"#;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_on_its_timer() {
        let (_, sink, executor) = setup(Config::default());
        let id = executor.enable();
        executor
            .init(use_case(&[r#"{"action":"sleep","sleep":"2"}"#]))
            .await;

        assert_eq!(executor.tick(id).await, TickOutcome::Waiting);
        assert!(executor.is_sleeping());
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Running));

        // A tick while sleeping does not restart the timer
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(executor.tick(id).await, TickOutcome::Waiting);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Running));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Completed));
        assert!(!executor.is_sleeping());
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].duration, 2000);

        match executor.tick(id).await {
            TickOutcome::Finished(report) => assert!(report.is_success()),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(executor.mode().await, ExecutorMode::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_sleep_waits_its_full_duration() {
        let (_, sink, executor) = setup(Config::default());
        let id = executor.enable();
        executor.init(use_case(&[SLEEP_2])).await;
        assert_eq!(executor.tick(id).await, TickOutcome::Waiting);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        executor.init(use_case(&[SLEEP_2])).await;
        assert_eq!(executor.tick(id).await, TickOutcome::Waiting);

        // The first timer fires in here, on behalf of the replaced use case
        tokio::time::sleep(Duration::from_millis(1010)).await;
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Running));
        assert!(executor.is_sleeping());
        assert!(sink.records().is_empty());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Completed));
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_sleep_restarts_from_scratch() {
        let (_, sink, executor) = setup(Config::default());
        let id = executor.enable();
        executor.init(use_case(&[SLEEP_2])).await;
        assert_eq!(executor.tick(id).await, TickOutcome::Waiting);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        executor.disable();
        assert!(!executor.is_sleeping());

        let id = executor.enable();
        assert_eq!(executor.tick(id).await, TickOutcome::Waiting);
        assert!(executor.is_sleeping());

        // Past the deadline of the interrupted timer
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Running));

        tokio::time::sleep(Duration::from_millis(1010)).await;
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Completed));
        assert_eq!(sink.records().len(), 1);
    }

    /// Completes every command, but bumps the enable id first as a racing disable would
    struct DisabledMidStep {
        enable_id: Arc<AtomicU64>,
    }

    #[async_trait::async_trait]
    impl StepExecutor for DisabledMidStep {
        fn name(&self) -> &'static str {
            "disabled-mid-step"
        }

        async fn step(&mut self, _index: usize, command: &mut Command) {
            self.enable_id.fetch_add(1, Ordering::SeqCst);
            command.set_status(CommandStatus::Running);
            command.set_status(CommandStatus::Completed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_finishing_after_disable_is_reported_on_next_enable() {
        let (_, sink, executor) = setup(Config::default());
        executor.state.lock().await.step = Box::new(DisabledMidStep {
            enable_id: executor.enable_id.clone(),
        });
        let id = executor.enable();
        executor.init(use_case(&[CLICK_OK])).await;

        assert_eq!(executor.tick(id).await, TickOutcome::Stale);
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Completed));
        assert!(sink.records().is_empty());

        let id = executor.enable();
        match executor.tick(id).await {
            TickOutcome::Finished(report) => assert_eq!(report.summary().completed, 1),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_step_finishing_after_disable_is_reported_once() {
        let (_, sink, executor) = setup(Config::default());
        executor.state.lock().await.step = Box::new(DisabledMidStep {
            enable_id: executor.enable_id.clone(),
        });
        let id = executor.enable();
        assert!(executor.execute_custom_step(parse_command(CLICK_OK).unwrap()).await);

        assert_eq!(executor.tick(id).await, TickOutcome::Stale);
        assert!(sink.records().is_empty());

        let id = executor.enable();
        match executor.tick(id).await {
            TickOutcome::CustomDone(record) => assert_eq!(record.state, CommandStatus::Completed),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_ticks_are_ignored() {
        let (driver, _, executor) = setup(Config::default());
        let old = executor.enable();
        executor.init(use_case(&[CLICK_OK])).await;
        let current = executor.enable();

        assert_eq!(executor.tick(old).await, TickOutcome::Stale);
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::NotStarted));
        assert!(driver.calls().is_empty());

        executor.disable();
        assert_eq!(executor.tick(current).await, TickOutcome::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_use_case() {
        let (driver, sink, executor) = setup(Config::default());
        let id = executor.enable();
        executor
            .init(use_case(&[
                CLICK_MISSING,
                r#"{"action":"type","target":{"resource_id":"app:id/name","located_by":"resource_id"},"text":"Ada"}"#,
                r#"{"action":"back"}"#,
            ]))
            .await;

        let mut cursors = Vec::new();
        let report = loop {
            match executor.tick(id).await {
                TickOutcome::Finished(report) => break report,
                TickOutcome::Stale | TickOutcome::Idle => panic!("executor stopped"),
                _ => {}
            }
            cursors.push(executor.cursor().await.unwrap());
        };

        assert!(cursors.windows(2).all(|w| w[0] <= w[1]));
        let summary = report.summary();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.unlocatable, 1);
        assert_eq!(summary.first_problem, 0);
        assert_eq!(summary.total_events, 4 + 1);

        assert_eq!(driver.current_tree().node(4).text, "Ada");
        assert_eq!(driver.calls().last(), Some(&DriverCall::Back));
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.reports(), vec![report]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_screen_reader_steps_escalate_when_stuck() {
        let config = Config {
            step_executor: StepStrategy::ScreenReader,
            ..Config::default()
        };
        let (driver, sink, executor) = setup(config);
        driver.update(|tree| tree.set_accessibility_focus(Some(1)));
        driver.set_frozen_focus(true);

        let id = executor.enable();
        executor.init(use_case(&[CLICK_OK])).await;
        for _ in 0..4 {
            assert_eq!(executor.tick(id).await, TickOutcome::Waiting);
        }
        assert_eq!(executor.tick(id).await, TickOutcome::Progress);

        assert_eq!(
            executor.command_status(0).await,
            Some(CommandStatus::CompletedByHelp)
        );
        assert_eq!(
            driver.calls().last(),
            Some(&DriverCall::Action(NodeHandle(3), NodeAction::Click))
        );
        assert_eq!(sink.records()[0].state, CommandStatus::CompletedByHelp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_step_runs_alone() {
        let (_, sink, executor) = setup(Config::default());
        let id = executor.enable();

        assert!(executor.execute_custom_step(parse_command(CLICK_OK).unwrap()).await);
        assert!(!executor.execute_custom_step(parse_command(CLICK_OK).unwrap()).await);
        assert_eq!(executor.mode().await, ExecutorMode::CustomStep);

        match executor.run_to_completion(id).await {
            Some(TickOutcome::CustomDone(record)) => {
                assert_eq!(record.state, CommandStatus::Completed)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(executor.mode().await, ExecutorMode::Idle);
        assert_eq!(sink.records().len(), 1);
        assert!(sink.reports().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_sleep_is_reported_once() {
        let (_, sink, executor) = setup(Config::default());
        let id = executor.enable();
        let sleep = parse_command(r#"{"action":"sleep","sleep":"1"}"#).unwrap();
        assert!(executor.execute_custom_step(sleep).await);

        let start = Instant::now();
        let outcome = executor.run_to_completion(id).await;
        assert!(matches!(outcome, Some(TickOutcome::CustomDone(_))));
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_cancels_in_flight_locate() {
        let (_, sink, executor) = setup(Config::default());
        let executor = Arc::new(executor);
        let id = executor.enable();
        executor.init(use_case(&[CLICK_MISSING, CLICK_OK])).await;

        let task = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.run_to_completion(id).await })
        };
        tokio::time::sleep(Duration::from_millis(600)).await;
        executor.disable();

        assert_eq!(task.await.unwrap(), None);
        assert_eq!(executor.command_status(0).await, Some(CommandStatus::Running));
        assert!(sink.records().is_empty());

        // A new enable period resumes where the old one stopped
        let id = executor.enable();
        match executor.run_to_completion(id).await {
            Some(TickOutcome::Finished(report)) => assert_eq!(report.summary().completed, 1),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
