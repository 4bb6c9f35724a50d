use super::locate::{AttemptOutcome, LocateStrategy};
use crate::error::EngineError;
use crate::widget::{ConcreteNode, WidgetDescriptor};
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    Found(ConcreteNode),
    Failed(EngineError),
    /// A newer locate or an interrupt superseded this one
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocateReport {
    pub outcome: LocateOutcome,
    /// Attempts that ended waiting
    pub attempts: u32,
}

/// Bounded attempt loop around a [`LocateStrategy`].
///
/// Every `locate` call takes a new generation. The loop checks its generation around
/// each suspension point and stops quietly once it is stale.
pub struct Locator {
    strategy: Box<dyn LocateStrategy>,
    generation: AtomicU64,
    max_attempts: u32,
    delay: Duration,
}

impl Locator {
    pub fn new(strategy: Box<dyn LocateStrategy>, max_attempts: u32, delay: Duration) -> Self {
        Self {
            strategy,
            generation: AtomicU64::new(0),
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub async fn locate(&self, descriptor: &WidgetDescriptor) -> LocateReport {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut attempts = 0;

        let outcome = loop {
            if !self.is_current(generation) {
                break LocateOutcome::Cancelled;
            }

            let attempt = self
                .strategy
                .locate_attempt(descriptor)
                .await
                .unwrap_or_else(|e| AttemptOutcome::Waiting(format!("driver error: {:#}", e)));

            if !self.is_current(generation) {
                break LocateOutcome::Cancelled;
            }

            match attempt {
                AttemptOutcome::Completed(node) => break LocateOutcome::Found(node),
                AttemptOutcome::Failed(err) => break LocateOutcome::Failed(err),
                AttemptOutcome::Waiting(reason) => {
                    attempts += 1;
                    debug!(
                        "[{}] attempt {}/{} waiting: {}",
                        self.strategy.name(),
                        attempts,
                        self.max_attempts,
                        reason
                    );
                    if attempts >= self.max_attempts {
                        break LocateOutcome::Failed(EngineError::MaxAttemptsExceeded { attempts });
                    }
                    tokio::time::sleep(self.delay).await;
                }
            }
        };

        LocateReport { outcome, attempts }
    }

    /// Cancel any in-flight `locate`
    pub fn interrupt(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
