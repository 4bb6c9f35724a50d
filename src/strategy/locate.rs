//! Per-attempt locate strategies.
//!
//! Each strategy answers one question per attempt: is the target resolved, still
//! pending, or impossible? Screen-reader strategies also nudge focus towards the match
//! and then ask to be polled again.

use crate::driver::traits::NodeAction;
use crate::error::EngineError;
use crate::widget::{ConcreteNode, MatchingService, WidgetDescriptor};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};

/// Result of one locate attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Completed(ConcreteNode),
    /// Try again after the locate delay
    Waiting(String),
    Failed(EngineError),
}

#[async_trait]
pub trait LocateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Driver errors are returned as `Err` and treated as a waiting attempt
    async fn locate_attempt(&self, descriptor: &WidgetDescriptor) -> Result<AttemptOutcome>;
}

/// Resolve through the matching service: exactly one match completes
pub struct DirectLocate {
    matcher: MatchingService,
}

impl DirectLocate {
    pub fn new(matcher: MatchingService) -> Self {
        Self { matcher }
    }
}

#[async_trait]
impl LocateStrategy for DirectLocate {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn locate_attempt(&self, descriptor: &WidgetDescriptor) -> Result<AttemptOutcome> {
        if descriptor.is_unlocatable() {
            return Ok(AttemptOutcome::Failed(EngineError::Unrecognizable(format!(
                "{} has no value for its locating attribute",
                descriptor
            ))));
        }

        let mut candidates = self.matcher.find_candidates(descriptor).await?;
        let outcome = match candidates.len() {
            0 => AttemptOutcome::Waiting(EngineError::NotFound(descriptor.to_string()).to_string()),
            1 => AttemptOutcome::Completed(candidates.remove(0)),
            count => {
                warn!("Ambiguous target {}:", descriptor);
                for candidate in &candidates {
                    warn!("  candidate {}", candidate);
                }
                AttemptOutcome::Waiting(
                    EngineError::Ambiguous {
                        descriptor: descriptor.to_string(),
                        count,
                    }
                    .to_string(),
                )
            }
        };
        Ok(outcome)
    }
}

/// Direct, but a match the user cannot see is a hard failure
pub struct TouchLocate {
    direct: DirectLocate,
}

impl TouchLocate {
    pub fn new(matcher: MatchingService) -> Self {
        Self {
            direct: DirectLocate::new(matcher),
        }
    }
}

#[async_trait]
impl LocateStrategy for TouchLocate {
    fn name(&self) -> &'static str {
        "touch"
    }

    async fn locate_attempt(&self, descriptor: &WidgetDescriptor) -> Result<AttemptOutcome> {
        Ok(match self.direct.locate_attempt(descriptor).await? {
            AttemptOutcome::Completed(node) if !node.visible => {
                AttemptOutcome::Failed(EngineError::NotVisible(node.describe()))
            }
            other => other,
        })
    }
}

/// Direct, then request accessibility focus on the match until it holds it
pub struct ScreenReaderApiLocate {
    direct: DirectLocate,
    matcher: MatchingService,
}

impl ScreenReaderApiLocate {
    pub fn new(matcher: MatchingService) -> Self {
        Self {
            direct: DirectLocate::new(matcher.clone()),
            matcher,
        }
    }
}

#[async_trait]
impl LocateStrategy for ScreenReaderApiLocate {
    fn name(&self) -> &'static str {
        "screen-reader-api"
    }

    async fn locate_attempt(&self, descriptor: &WidgetDescriptor) -> Result<AttemptOutcome> {
        Ok(match self.direct.locate_attempt(descriptor).await? {
            AttemptOutcome::Completed(node) if !node.accessibility_focused => {
                let accepted = self
                    .matcher
                    .driver()
                    .perform_action(node.handle, &NodeAction::AccessibilityFocus)
                    .await?;
                if !accepted {
                    return Ok(AttemptOutcome::Failed(EngineError::ActionRejected(format!(
                        "focus request refused by {}",
                        node.describe()
                    ))));
                }
                debug!("Focus requested on {}", node.handle);
                AttemptOutcome::Waiting(format!("moving focus to {}", node.describe()))
            }
            other => other,
        })
    }
}

/// Direct, then explore-by-touch on the match until it holds focus
pub struct ScreenReaderTouchLocate {
    direct: DirectLocate,
    matcher: MatchingService,
}

impl ScreenReaderTouchLocate {
    pub fn new(matcher: MatchingService) -> Self {
        Self {
            direct: DirectLocate::new(matcher.clone()),
            matcher,
        }
    }
}

#[async_trait]
impl LocateStrategy for ScreenReaderTouchLocate {
    fn name(&self) -> &'static str {
        "screen-reader-touch"
    }

    async fn locate_attempt(&self, descriptor: &WidgetDescriptor) -> Result<AttemptOutcome> {
        Ok(match self.direct.locate_attempt(descriptor).await? {
            AttemptOutcome::Completed(node) if !node.accessibility_focused => {
                if node.bounds.is_empty() {
                    return Ok(AttemptOutcome::Failed(EngineError::NotClickable(
                        node.describe(),
                    )));
                }
                let (x, y) = node.bounds.center();
                self.matcher.driver().tap(x, y).await?;
                AttemptOutcome::Waiting(format!("touched {} at ({}, {})", node.handle, x, y))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, ReplayDriver};
    use crate::widget::Attribute;
    use std::sync::Arc;

    const SCREEN: &str = r#"<hierarchy>
  <node class="Frame" bounds="[0,0][1000,1000]">
    <node class="Button" text="OK" clickable="true" bounds="[0,0][200,100]"/>
    <node class="Button" text="Later" visible-to-user="false" bounds="[0,0][0,0]"/>
    <node class="Button" text="Twin" bounds="[0,100][200,200]"/>
    <node class="Button" text="Twin" bounds="[0,200][200,300]"/>
  </node>
</hierarchy>"#;

    fn setup() -> (Arc<ReplayDriver>, MatchingService) {
        let driver = Arc::new(ReplayDriver::from_xml(SCREEN).unwrap());
        let matcher = MatchingService::new(driver.clone(), &[]);
        (driver, matcher)
    }

    fn by_text(text: &str) -> WidgetDescriptor {
        WidgetDescriptor::new()
            .with_text(text)
            .located_by(Attribute::Text)
    }

    #[tokio::test]
    async fn test_direct_outcomes() {
        let (_, matcher) = setup();
        let direct = DirectLocate::new(matcher);

        assert!(matches!(
            direct.locate_attempt(&by_text("OK")).await.unwrap(),
            AttemptOutcome::Completed(_)
        ));
        assert!(matches!(
            direct.locate_attempt(&by_text("Twin")).await.unwrap(),
            AttemptOutcome::Waiting(_)
        ));
        assert!(matches!(
            direct.locate_attempt(&by_text("Missing")).await.unwrap(),
            AttemptOutcome::Waiting(_)
        ));
    }

    #[tokio::test]
    async fn test_empty_xpath_authority_fails_immediately() {
        let (_, matcher) = setup();
        let descriptor = WidgetDescriptor::new()
            .with_class_name("Button")
            .located_by(Attribute::Xpath);
        let outcome = DirectLocate::new(matcher)
            .locate_attempt(&descriptor)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed(EngineError::Unrecognizable(_))
        ));
    }

    #[tokio::test]
    async fn test_touch_rejects_invisible_match() {
        let (_, matcher) = setup();
        let outcome = TouchLocate::new(matcher)
            .locate_attempt(&by_text("Later"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed(EngineError::NotVisible(_))
        ));
    }

    #[tokio::test]
    async fn test_screen_reader_api_requests_focus_then_completes() {
        let (driver, matcher) = setup();
        let strategy = ScreenReaderApiLocate::new(matcher);

        let first = strategy.locate_attempt(&by_text("OK")).await.unwrap();
        assert!(matches!(first, AttemptOutcome::Waiting(_)));
        assert!(matches!(
            driver.calls().last(),
            Some(DriverCall::Action(_, NodeAction::AccessibilityFocus))
        ));

        let second = strategy.locate_attempt(&by_text("OK")).await.unwrap();
        assert!(matches!(second, AttemptOutcome::Completed(node) if node.accessibility_focused));
    }

    #[tokio::test]
    async fn test_screen_reader_api_refused_focus_fails() {
        let (driver, matcher) = setup();
        driver.set_reject_actions(true);
        let outcome = ScreenReaderApiLocate::new(matcher)
            .locate_attempt(&by_text("OK"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed(EngineError::ActionRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_screen_reader_touch_taps_center() {
        let (driver, matcher) = setup();
        let strategy = ScreenReaderTouchLocate::new(matcher);

        let first = strategy.locate_attempt(&by_text("OK")).await.unwrap();
        assert!(matches!(first, AttemptOutcome::Waiting(_)));
        assert_eq!(driver.calls(), vec![DriverCall::Tap(100, 50)]);

        let second = strategy.locate_attempt(&by_text("OK")).await.unwrap();
        assert!(matches!(second, AttemptOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_screen_reader_touch_needs_bounds() {
        let (_, matcher) = setup();
        let outcome = ScreenReaderTouchLocate::new(matcher)
            .locate_attempt(&by_text("Later"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AttemptOutcome::Failed(EngineError::NotClickable(_))
        ));
    }
}
