use crate::driver::AccessibilityDriver;
use crate::error::EngineError;
use crate::runner::step::StepStrategy;
use crate::strategy::InteractionMode;
use crate::widget::Attribute;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Locator / action-performer pair used by the controller
    pub mode: InteractionMode,

    /// Step executor used by the use-case executor
    pub step_executor: StepStrategy,

    /// Locate attempts before a command fails with FAILED_LOCATE
    pub locate_max_attempts: u32,

    /// Delay between locate attempts (ms)
    pub locate_delay_ms: u64,

    /// Executor polling interval (ms)
    pub tick_interval_ms: u64,

    /// Length of one `sleep` unit (ms). Scripts count sleeps in seconds.
    pub sleep_unit_ms: u64,

    /// Screen-reader stopping criterion: visits of a single focused node
    pub max_visits_per_node: u32,

    /// Screen-reader stopping criterion: total acting attempts for one command
    pub max_acting_attempts: u32,

    /// Ticks to wait for accessibility focus before nudging, and again before failing
    pub focus_settle_ticks: u32,

    /// Attributes excluded from similarity comparison
    pub masked_attributes: Vec<Attribute>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: InteractionMode::default(),
            step_executor: StepStrategy::default(),
            locate_max_attempts: 4,
            locate_delay_ms: 500,
            tick_interval_ms: 300,
            sleep_unit_ms: 1000,
            max_visits_per_node: 4,
            max_acting_attempts: 50,
            focus_settle_ticks: 3,
            masked_attributes: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn locate_delay(&self) -> Duration {
        Duration::from_millis(self.locate_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn sleep_duration(&self, units: u64) -> Duration {
        Duration::from_millis(self.sleep_unit_ms.saturating_mul(units))
    }

    /// Refuse screen-reader execution on a driver that cannot see accessibility focus
    pub fn check_driver(
        &self,
        driver: &dyn AccessibilityDriver,
    ) -> std::result::Result<(), EngineError> {
        if driver.reports_accessibility_focus() {
            return Ok(());
        }
        let mode = if self.mode.is_screen_reader() {
            self.mode.name()
        } else if self.step_executor == StepStrategy::ScreenReader {
            "sequential stepping"
        } else {
            return Ok(());
        };
        Err(EngineError::Unsupported {
            mode: mode.to_string(),
            platform: driver.platform_name().to_string(),
        })
    }
}
