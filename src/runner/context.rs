use super::events::{EngineEvent, EventEmitter};
use crate::command::Command;
use crate::driver::traits::AccessibilityDriver;
use crate::report::{CommandRecord, ResultSink};
use crate::utils::Config;
use crate::widget::MatchingService;
use log::{error, info};
use std::sync::Arc;

/// Everything the controllers and the executor share, built once per run
pub struct ExecutionContext {
    pub config: Config,
    pub matcher: MatchingService,
    pub sink: Arc<dyn ResultSink>,
    pub events: EventEmitter,
}

impl ExecutionContext {
    pub fn new(
        config: Config,
        driver: Arc<dyn AccessibilityDriver>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        let matcher = MatchingService::new(driver, &config.masked_attributes);
        Self {
            config,
            matcher,
            sink,
            events: EventEmitter::default(),
        }
    }

    pub fn driver(&self) -> &Arc<dyn AccessibilityDriver> {
        self.matcher.driver()
    }

    /// Write the record of a terminal command. Sink failures are logged, never raised.
    pub fn report(&self, index: Option<usize>, command: &Command) -> CommandRecord {
        let record = CommandRecord::from(command);
        info!(
            "{} -> {} ({}ms)",
            command.action(),
            record.state,
            record.duration
        );
        self.write(&record);
        self.events.emit(EngineEvent::CommandFinished {
            index,
            state: record.state,
            duration_ms: record.duration,
            error: record.error.clone(),
        });
        record
    }

    pub fn write(&self, record: &CommandRecord) {
        if let Err(e) = self.sink.write_record(record) {
            error!("Failed to write result record: {:#}", e);
        }
    }

    pub fn command_started(&self, index: Option<usize>, command: &Command) {
        self.events.emit(EngineEvent::CommandStarted {
            index,
            command: command.action().to_string(),
        });
    }
}
