//! In-memory driver over a captured hierarchy.
//!
//! The replay driver behaves like a device with a screen reader running: swipes move
//! accessibility focus through the focus order, a tap focuses the node under the finger
//! and a double tap activates the focused node. It backs dry runs from a uiautomator
//! dump and the engine's tests.

use super::traits::{AccessibilityDriver, NodeAction, SwipeDirection};
use super::uiautomator::parse_tree;
use crate::widget::{NodeHandle, UiTree};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// One request received by the replay driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Action(NodeHandle, NodeAction),
    Tap(i32, i32),
    DoubleTap,
    Swipe(SwipeDirection),
    Back,
}

pub struct ReplayDriver {
    tree: Mutex<UiTree>,
    calls: Mutex<Vec<DriverCall>>,
    frozen_focus: AtomicBool,
    reject_actions: AtomicBool,
}

impl ReplayDriver {
    pub fn new(tree: UiTree) -> Self {
        Self {
            tree: Mutex::new(tree),
            calls: Mutex::new(Vec::new()),
            frozen_focus: AtomicBool::new(false),
            reject_actions: AtomicBool::new(false),
        }
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(Self::new(parse_tree(xml)?))
    }

    /// Load a uiautomator dump from disk
    pub fn load(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hierarchy: {}", path.display()))?;
        Self::from_xml(&xml)
    }

    /// Stop accessibility focus from moving, like a screen reader stuck on one node
    pub fn set_frozen_focus(&self, frozen: bool) {
        self.frozen_focus.store(frozen, Ordering::SeqCst);
    }

    /// Make every accessibility action report failure
    pub fn set_reject_actions(&self, reject: bool) {
        self.reject_actions.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        lock(&self.calls).clone()
    }

    pub fn current_tree(&self) -> UiTree {
        lock(&self.tree).clone()
    }

    /// Mutate the simulated screen
    pub fn update<F: FnOnce(&mut UiTree)>(&self, f: F) {
        f(&mut lock(&self.tree));
    }

    fn record(&self, call: DriverCall) {
        debug!("replay: {:?}", call);
        lock(&self.calls).push(call);
    }

    fn focus_frozen(&self) -> bool {
        self.frozen_focus.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl AccessibilityDriver for ReplayDriver {
    fn platform_name(&self) -> &str {
        "replay"
    }

    async fn snapshot(&self) -> Result<UiTree> {
        Ok(self.current_tree())
    }

    async fn perform_action(&self, node: NodeHandle, action: &NodeAction) -> Result<bool> {
        self.record(DriverCall::Action(node, action.clone()));
        if self.reject_actions.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let mut tree = lock(&self.tree);
        let Some(index) = tree.find_handle(node) else {
            return Ok(false);
        };

        let accepted = match action {
            NodeAction::Click => tree.clickable_ancestor(index).is_some(),
            NodeAction::SetText(text) => {
                tree.node_mut(index).text = text.clone();
                true
            }
            NodeAction::AccessibilityFocus => {
                if !self.focus_frozen() {
                    tree.set_accessibility_focus(Some(index));
                }
                true
            }
        };
        Ok(accepted)
    }

    async fn tap(&self, x: i32, y: i32) -> Result<()> {
        self.record(DriverCall::Tap(x, y));
        if self.focus_frozen() {
            return Ok(());
        }

        let mut tree = lock(&self.tree);
        // Explore-by-touch focuses the innermost focusable node under the finger
        let target = tree.node_at(x, y).and_then(|mut index| loop {
            if tree.node(index).is_focusable() {
                break Some(index);
            }
            index = tree.node(index).parent?;
        });
        if target.is_some() {
            tree.set_accessibility_focus(target);
        }
        Ok(())
    }

    async fn double_tap(&self) -> Result<()> {
        self.record(DriverCall::DoubleTap);
        let tree = lock(&self.tree);
        let focused = tree
            .accessibility_focused()
            .context("Nothing holds accessibility focus")?;
        if self.reject_actions.load(Ordering::SeqCst) || tree.clickable_ancestor(focused).is_none()
        {
            anyhow::bail!("Focused node cannot be activated");
        }
        Ok(())
    }

    async fn swipe(&self, direction: SwipeDirection) -> Result<()> {
        self.record(DriverCall::Swipe(direction));
        if self.focus_frozen() {
            return Ok(());
        }

        let mut tree = lock(&self.tree);
        let current = tree.accessibility_focused();
        let next = match direction {
            SwipeDirection::Right => tree.focus_neighbour(current, true),
            SwipeDirection::Left => tree.focus_neighbour(current, false),
            SwipeDirection::Down => tree.jump_target(current, true),
            SwipeDirection::Up => tree.jump_target(current, false),
        };
        // At either end of the list focus stays where it is
        if next.is_some() {
            tree.set_accessibility_focus(next);
        }
        Ok(())
    }

    async fn global_back(&self) -> Result<()> {
        self.record(DriverCall::Back);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: &str = r#"<hierarchy>
  <node class="Frame" bounds="[0,0][1000,1000]">
    <node class="Text" text="Title" bounds="[0,0][1000,100]"/>
    <node class="Button" text="OK" clickable="true" bounds="[0,100][500,200]"/>
    <node class="Layout" bounds="[0,200][1000,400]">
      <node class="Image" bounds="[0,200][100,300]"/>
    </node>
  </node>
</hierarchy>"#;

    #[tokio::test]
    async fn test_swipe_walks_focus_order() {
        let driver = ReplayDriver::from_xml(SCREEN).unwrap();
        driver.swipe(SwipeDirection::Right).await.unwrap();
        assert_eq!(driver.current_tree().accessibility_focused(), Some(1));
        driver.swipe(SwipeDirection::Right).await.unwrap();
        assert_eq!(driver.current_tree().accessibility_focused(), Some(2));
        // End of the list: focus stays
        driver.swipe(SwipeDirection::Right).await.unwrap();
        assert_eq!(driver.current_tree().accessibility_focused(), Some(2));
        driver.swipe(SwipeDirection::Left).await.unwrap();
        assert_eq!(driver.current_tree().accessibility_focused(), Some(1));
    }

    #[tokio::test]
    async fn test_frozen_focus_ignores_gestures() {
        let driver = ReplayDriver::from_xml(SCREEN).unwrap();
        driver.set_frozen_focus(true);
        driver.swipe(SwipeDirection::Right).await.unwrap();
        driver.tap(250, 150).await.unwrap();
        assert_eq!(driver.current_tree().accessibility_focused(), None);
        assert_eq!(driver.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_tap_focuses_node_under_finger() {
        let driver = ReplayDriver::from_xml(SCREEN).unwrap();
        driver.tap(250, 150).await.unwrap();
        assert_eq!(driver.current_tree().accessibility_focused(), Some(2));
    }

    #[tokio::test]
    async fn test_double_tap_requires_focus() {
        let driver = ReplayDriver::from_xml(SCREEN).unwrap();
        assert!(driver.double_tap().await.is_err());
        driver.tap(250, 150).await.unwrap();
        assert!(driver.double_tap().await.is_ok());
    }

    #[tokio::test]
    async fn test_actions_and_rejection() {
        let driver = ReplayDriver::from_xml(SCREEN).unwrap();
        let ok = NodeHandle(2);
        assert!(driver.perform_action(ok, &NodeAction::Click).await.unwrap());
        assert!(!driver
            .perform_action(NodeHandle(1), &NodeAction::Click)
            .await
            .unwrap());

        driver.set_reject_actions(true);
        assert!(!driver.perform_action(ok, &NodeAction::Click).await.unwrap());
        assert_eq!(
            driver.calls().last(),
            Some(&DriverCall::Action(ok, NodeAction::Click))
        );
    }
}
