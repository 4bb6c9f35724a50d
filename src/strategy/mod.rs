//! Locator / action-performer pairs for each interaction mode.

pub mod locate;
pub mod locator;
pub mod performer;

pub use locate::{
    AttemptOutcome, DirectLocate, LocateStrategy, ScreenReaderApiLocate, ScreenReaderTouchLocate,
    TouchLocate,
};
pub use locator::{LocateOutcome, LocateReport, Locator};
pub use performer::{ActionPerformer, DirectPerformer, ScreenReaderPerformer};

use crate::utils::Config;
use crate::widget::MatchingService;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How commands reach their targets
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    /// Direct addressing, refusing targets the user cannot see
    Touch,
    /// Direct addressing through accessibility actions
    #[default]
    AccessibilityApi,
    /// Screen reader, focus moved with accessibility actions
    ScreenReaderApi,
    /// Screen reader, focus moved by touching the target
    ScreenReaderTouch,
}

impl InteractionMode {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Touch => "touch",
            InteractionMode::AccessibilityApi => "accessibility-api",
            InteractionMode::ScreenReaderApi => "screen-reader-api",
            InteractionMode::ScreenReaderTouch => "screen-reader-touch",
        }
    }

    pub fn is_screen_reader(&self) -> bool {
        matches!(
            self,
            InteractionMode::ScreenReaderApi | InteractionMode::ScreenReaderTouch
        )
    }

    /// Build the locator and action performer for this mode
    pub fn build(
        self,
        matcher: &MatchingService,
        config: &Config,
    ) -> (Locator, Box<dyn ActionPerformer>) {
        let strategy: Box<dyn LocateStrategy> = match self {
            InteractionMode::Touch => Box::new(TouchLocate::new(matcher.clone())),
            InteractionMode::AccessibilityApi => Box::new(DirectLocate::new(matcher.clone())),
            InteractionMode::ScreenReaderApi => {
                Box::new(ScreenReaderApiLocate::new(matcher.clone()))
            }
            InteractionMode::ScreenReaderTouch => {
                Box::new(ScreenReaderTouchLocate::new(matcher.clone()))
            }
        };
        let performer: Box<dyn ActionPerformer> = if self.is_screen_reader() {
            Box::new(ScreenReaderPerformer::new(matcher.clone()))
        } else {
            Box::new(DirectPerformer::new(matcher.clone()))
        };

        let locator = Locator::new(
            strategy,
            config.locate_max_attempts,
            config.locate_delay(),
        );
        (locator, performer)
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ReplayDriver;
    use std::sync::Arc;

    #[test]
    fn test_mode_names_round_trip_through_serde() {
        let mode: InteractionMode = serde_yaml::from_str("screen-reader-api").unwrap();
        assert_eq!(mode, InteractionMode::ScreenReaderApi);
        assert_eq!(InteractionMode::default().to_string(), "accessibility-api");
    }

    #[test]
    fn test_build_pairs() {
        let driver = Arc::new(ReplayDriver::new(Default::default()));
        let matcher = MatchingService::new(driver, &[]);
        let config = Config::default();

        let (locator, performer) = InteractionMode::Touch.build(&matcher, &config);
        assert_eq!(
            (locator.strategy_name(), performer.name()),
            ("touch", "direct")
        );
        let (locator, performer) = InteractionMode::ScreenReaderTouch.build(&matcher, &config);
        assert_eq!(
            (locator.strategy_name(), performer.name()),
            ("screen-reader-touch", "screen-reader")
        );
    }
}
