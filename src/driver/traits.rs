use crate::widget::{NodeHandle, UiTree};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Swipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        };
        f.write_str(name)
    }
}

/// Accessibility action invoked directly on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    Click,
    SetText(String),
    AccessibilityFocus,
}

/// Platform accessibility layer.
///
/// The engine only reads snapshots and requests actions or gestures through this
/// interface; it never mutates the screen any other way.
#[async_trait]
pub trait AccessibilityDriver: Send + Sync {
    /// Get the platform name (e.g., "android", "replay")
    fn platform_name(&self) -> &str;

    /// Whether snapshots say which node holds accessibility focus. Screen-reader
    /// execution cannot work without it.
    fn reports_accessibility_focus(&self) -> bool {
        true
    }

    /// Take a fresh snapshot of the accessibility tree
    async fn snapshot(&self) -> Result<UiTree>;

    /// Invoke an accessibility action on a node.
    ///
    /// # Returns
    /// `false` when the platform refused the action
    async fn perform_action(&self, node: NodeHandle, action: &NodeAction) -> Result<bool>;

    /// Inject a single tap at screen coordinates
    async fn tap(&self, x: i32, y: i32) -> Result<()>;

    /// Screen-reader activation gesture on whatever holds accessibility focus
    async fn double_tap(&self) -> Result<()>;

    /// Swipe in a direction
    async fn swipe(&self, direction: SwipeDirection) -> Result<()>;

    /// Press the back button
    async fn global_back(&self) -> Result<()>;
}
