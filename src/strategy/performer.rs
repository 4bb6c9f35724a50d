//! Action performers carry out a command's effect once its target is resolved, and
//! run the target-less navigation commands.

use crate::command::Action;
use crate::driver::traits::{NodeAction, SwipeDirection};
use crate::error::EngineError;
use crate::widget::{ConcreteNode, MatchingService, UiTree};
use async_trait::async_trait;
use log::debug;

fn rejected(err: anyhow::Error) -> EngineError {
    EngineError::ActionRejected(format!("{:#}", err))
}

#[async_trait]
pub trait ActionPerformer: Send + Sync {
    fn name(&self) -> &'static str;

    fn matcher(&self) -> &MatchingService;

    /// Act on a resolved node
    async fn execute(&self, action: &Action, node: &ConcreteNode) -> Result<(), EngineError> {
        match action {
            Action::Click(_) => self.execute_click(node).await,
            Action::Type { text, .. } => self.execute_type(node, text).await,
            Action::Focus(_) => self.execute_focus(node).await,
            other => Err(EngineError::Unrecognizable(format!(
                "{} does not act on a widget",
                other.name()
            ))),
        }
    }

    /// Run a navigation command and return the node focused afterwards
    async fn navigate(&self, action: &Action) -> Result<Option<ConcreteNode>, EngineError> {
        match action {
            Action::Next => self.navigate_next().await?,
            Action::Previous => self.navigate_previous().await?,
            Action::JumpNext => self.navigate_jump_next().await?,
            Action::JumpPrevious => self.navigate_jump_previous().await?,
            Action::Select => self.navigate_select().await?,
            Action::Back => self.navigate_back().await?,
            other => {
                return Err(EngineError::Unrecognizable(format!(
                    "{} is not a navigation",
                    other.name()
                )))
            }
        }
        self.matcher().focused().await.map_err(rejected)
    }

    async fn execute_click(&self, node: &ConcreteNode) -> Result<(), EngineError>;
    async fn execute_type(&self, node: &ConcreteNode, text: &str) -> Result<(), EngineError>;
    async fn execute_focus(&self, node: &ConcreteNode) -> Result<(), EngineError>;

    async fn navigate_next(&self) -> Result<(), EngineError>;
    async fn navigate_previous(&self) -> Result<(), EngineError>;
    async fn navigate_jump_next(&self) -> Result<(), EngineError>;
    async fn navigate_jump_previous(&self) -> Result<(), EngineError>;
    async fn navigate_select(&self) -> Result<(), EngineError>;

    async fn navigate_back(&self) -> Result<(), EngineError> {
        self.matcher().driver().global_back().await.map_err(rejected)
    }
}

/// Acts through accessibility actions addressed at nodes
pub struct DirectPerformer {
    matcher: MatchingService,
}

impl DirectPerformer {
    pub fn new(matcher: MatchingService) -> Self {
        Self { matcher }
    }

    async fn snapshot(&self) -> Result<UiTree, EngineError> {
        self.matcher.driver().snapshot().await.map_err(rejected)
    }

    async fn perform(
        &self,
        tree: &UiTree,
        index: usize,
        action: NodeAction,
    ) -> Result<(), EngineError> {
        let node = tree.node(index);
        let accepted = self
            .matcher
            .driver()
            .perform_action(node.handle, &action)
            .await
            .map_err(rejected)?;
        if accepted {
            Ok(())
        } else {
            Err(EngineError::ActionRejected(format!(
                "{:?} on {} [{}]",
                action, node.handle, node.class_name
            )))
        }
    }

    /// Click `index` or its nearest clickable ancestor
    async fn click_index(&self, tree: &UiTree, index: usize) -> Result<(), EngineError> {
        let target = tree.clickable_ancestor(index).ok_or_else(|| {
            EngineError::NotClickable(format!(
                "{} [{}] has no clickable ancestor",
                tree.node(index).handle,
                tree.node(index).class_name
            ))
        })?;
        self.perform(tree, target, NodeAction::Click).await
    }

    async fn locate_in(
        &self,
        node: &ConcreteNode,
    ) -> Result<(UiTree, usize), EngineError> {
        let tree = self.snapshot().await?;
        let index = tree.find_handle(node.handle).ok_or_else(|| {
            EngineError::ActionRejected(format!("{} is no longer on screen", node.describe()))
        })?;
        Ok((tree, index))
    }

    /// Move accessibility focus along the focus order
    async fn move_focus(&self, jump: bool, forward: bool) -> Result<(), EngineError> {
        let tree = self.snapshot().await?;
        let current = tree.accessibility_focused();
        let target = if jump {
            tree.jump_target(current, forward)
        } else {
            tree.focus_neighbour(current, forward)
        };
        let target = target.ok_or_else(|| {
            EngineError::ActionRejected(format!(
                "no {} node to move focus to",
                if forward { "next" } else { "previous" }
            ))
        })?;
        self.perform(&tree, target, NodeAction::AccessibilityFocus).await
    }
}

#[async_trait]
impl ActionPerformer for DirectPerformer {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn matcher(&self) -> &MatchingService {
        &self.matcher
    }

    async fn execute_click(&self, node: &ConcreteNode) -> Result<(), EngineError> {
        let (tree, index) = self.locate_in(node).await?;
        self.click_index(&tree, index).await
    }

    async fn execute_type(&self, node: &ConcreteNode, text: &str) -> Result<(), EngineError> {
        let (tree, index) = self.locate_in(node).await?;
        self.perform(&tree, index, NodeAction::SetText(text.to_string()))
            .await
    }

    async fn execute_focus(&self, node: &ConcreteNode) -> Result<(), EngineError> {
        let (tree, index) = self.locate_in(node).await?;
        self.perform(&tree, index, NodeAction::AccessibilityFocus)
            .await
    }

    async fn navigate_next(&self) -> Result<(), EngineError> {
        self.move_focus(false, true).await
    }

    async fn navigate_previous(&self) -> Result<(), EngineError> {
        self.move_focus(false, false).await
    }

    async fn navigate_jump_next(&self) -> Result<(), EngineError> {
        self.move_focus(true, true).await
    }

    async fn navigate_jump_previous(&self) -> Result<(), EngineError> {
        self.move_focus(true, false).await
    }

    async fn navigate_select(&self) -> Result<(), EngineError> {
        let tree = self.snapshot().await?;
        let focused = tree
            .accessibility_focused()
            .ok_or_else(|| EngineError::ActionRejected("nothing holds focus".into()))?;
        self.click_index(&tree, focused).await
    }
}

/// Acts the way a screen-reader user does: gestures relative to the focused node
pub struct ScreenReaderPerformer {
    matcher: MatchingService,
}

impl ScreenReaderPerformer {
    pub fn new(matcher: MatchingService) -> Self {
        Self { matcher }
    }

    async fn require_focus(&self, node: &ConcreteNode) -> Result<(), EngineError> {
        let focused = self.matcher.focused().await.map_err(rejected)?;
        match focused {
            Some(current) if current.is_same_node(node) => Ok(()),
            Some(current) => Err(EngineError::ActionRejected(format!(
                "focus is on {}, not {}",
                current.describe(),
                node.describe()
            ))),
            None => Err(EngineError::ActionRejected(format!(
                "{} does not hold focus",
                node.describe()
            ))),
        }
    }

    async fn swipe(&self, direction: SwipeDirection) -> Result<(), EngineError> {
        debug!("Screen reader swipe {}", direction);
        self.matcher.driver().swipe(direction).await.map_err(rejected)
    }
}

#[async_trait]
impl ActionPerformer for ScreenReaderPerformer {
    fn name(&self) -> &'static str {
        "screen-reader"
    }

    fn matcher(&self) -> &MatchingService {
        &self.matcher
    }

    async fn execute_click(&self, node: &ConcreteNode) -> Result<(), EngineError> {
        self.require_focus(node).await?;
        self.matcher.driver().double_tap().await.map_err(rejected)
    }

    async fn execute_type(&self, node: &ConcreteNode, text: &str) -> Result<(), EngineError> {
        self.require_focus(node).await?;
        let accepted = self
            .matcher
            .driver()
            .perform_action(node.handle, &NodeAction::SetText(text.to_string()))
            .await
            .map_err(rejected)?;
        if accepted {
            Ok(())
        } else {
            Err(EngineError::ActionRejected(format!(
                "set text refused by {}",
                node.describe()
            )))
        }
    }

    async fn execute_focus(&self, node: &ConcreteNode) -> Result<(), EngineError> {
        self.require_focus(node).await
    }

    async fn navigate_next(&self) -> Result<(), EngineError> {
        self.swipe(SwipeDirection::Right).await
    }

    async fn navigate_previous(&self) -> Result<(), EngineError> {
        self.swipe(SwipeDirection::Left).await
    }

    async fn navigate_jump_next(&self) -> Result<(), EngineError> {
        self.swipe(SwipeDirection::Down).await
    }

    async fn navigate_jump_previous(&self) -> Result<(), EngineError> {
        self.swipe(SwipeDirection::Up).await
    }

    async fn navigate_select(&self) -> Result<(), EngineError> {
        self.matcher.driver().double_tap().await.map_err(rejected)
    }
}
