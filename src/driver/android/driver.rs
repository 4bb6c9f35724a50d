use super::adb;
use crate::driver::traits::{AccessibilityDriver, NodeAction, SwipeDirection};
use crate::driver::uiautomator::parse_tree;
use crate::widget::{NodeHandle, UiTree};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use tokio::sync::Mutex;

/// Swipe duration used for screen-reader gestures
const GESTURE_MS: u64 = 200;
/// Gap between the two taps of a double tap
const DOUBLE_TAP_GAP_MS: u64 = 80;

/// Escape text for `adb shell input text`
pub fn escape_for_android_shell(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(' ', "%s")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
        .replace('&', "\\&")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('|', "\\|")
        .replace(';', "\\;")
}

/// Start and end points of a swipe across a screen of the given size
pub fn swipe_points(direction: SwipeDirection, width: i32, height: i32) -> (i32, i32, i32, i32) {
    let (cx, cy) = (width / 2, height / 2);
    match direction {
        SwipeDirection::Up => (cx, height * 3 / 4, cx, height / 4),
        SwipeDirection::Down => (cx, height / 4, cx, height * 3 / 4),
        SwipeDirection::Left => (width * 3 / 4, cy, width / 4, cy),
        SwipeDirection::Right => (width / 4, cy, width * 3 / 4, cy),
    }
}

/// Android driver backed by adb and uiautomator.
///
/// uiautomator dumps carry no stable node ids, so handles are only valid against the
/// most recent snapshot. Actions resolve a handle through that cached tree.
pub struct AndroidDriver {
    serial: Option<String>,
    screen_size: (u32, u32),
    last_tree: Mutex<UiTree>,
}

impl AndroidDriver {
    /// Create a new Android driver
    pub async fn new(serial: Option<&str>) -> Result<Self> {
        let selected_serial = if let Some(s) = serial {
            Some(s.to_string())
        } else {
            let devices = adb::get_devices().await?;
            match devices.as_slice() {
                [] => anyhow::bail!("No Android devices connected"),
                [only] => Some(only.serial.clone()),
                _ => anyhow::bail!("Multiple devices connected. Please specify one with --device"),
            }
        };

        let screen_size = adb::get_screen_size(selected_serial.as_deref()).await?;
        debug!(
            "Android device {:?} at {}x{}",
            selected_serial, screen_size.0, screen_size.1
        );

        Ok(Self {
            serial: selected_serial,
            screen_size,
            last_tree: Mutex::new(UiTree::new()),
        })
    }

    fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    async fn dump_hierarchy(&self) -> Result<String> {
        match adb::exec_out(self.serial(), "uiautomator dump /dev/stdout").await {
            Ok(output) if output.contains("<?xml") => Ok(output),
            _ => {
                // Older Android versions cannot dump to stdout
                adb::shell(
                    self.serial(),
                    "uiautomator dump /sdcard/window_dump.xml > /dev/null && cat /sdcard/window_dump.xml",
                )
                .await
            }
        }
    }

    async fn node_center(&self, handle: NodeHandle) -> Option<(i32, i32)> {
        let tree = self.last_tree.lock().await;
        let index = tree.find_handle(handle)?;
        let bounds = tree.node(index).bounds;
        (!bounds.is_empty()).then(|| bounds.center())
    }

    async fn input_tap(&self, x: i32, y: i32) -> Result<()> {
        adb::shell(self.serial(), &format!("input tap {} {}", x, y)).await?;
        Ok(())
    }
}

#[async_trait]
impl AccessibilityDriver for AndroidDriver {
    fn platform_name(&self) -> &str {
        "android"
    }

    // uiautomator dumps have no accessibility-focused attribute
    fn reports_accessibility_focus(&self) -> bool {
        false
    }

    async fn snapshot(&self) -> Result<UiTree> {
        let xml = self.dump_hierarchy().await?;
        let tree = parse_tree(&xml).context("Failed to parse uiautomator dump")?;
        *self.last_tree.lock().await = tree.clone();
        Ok(tree)
    }

    async fn perform_action(&self, node: NodeHandle, action: &NodeAction) -> Result<bool> {
        let Some((x, y)) = self.node_center(node).await else {
            debug!("Node {} has no usable bounds", node);
            return Ok(false);
        };

        match action {
            NodeAction::Click => self.input_tap(x, y).await?,
            NodeAction::SetText(text) => {
                self.input_tap(x, y).await?;
                let escaped = escape_for_android_shell(text);
                adb::shell(self.serial(), &format!("input text \"{}\"", escaped)).await?;
            }
            NodeAction::AccessibilityFocus => {
                warn!("adb cannot move accessibility focus directly");
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn tap(&self, x: i32, y: i32) -> Result<()> {
        self.input_tap(x, y).await
    }

    async fn double_tap(&self) -> Result<()> {
        let (x, y) = (
            self.screen_size.0 as i32 / 2,
            self.screen_size.1 as i32 / 2,
        );
        self.input_tap(x, y).await?;
        tokio::time::sleep(Duration::from_millis(DOUBLE_TAP_GAP_MS)).await;
        self.input_tap(x, y).await
    }

    async fn swipe(&self, direction: SwipeDirection) -> Result<()> {
        let (width, height) = adb::get_screen_size(self.serial())
            .await
            .unwrap_or(self.screen_size);
        let (x1, y1, x2, y2) = swipe_points(direction, width as i32, height as i32);
        adb::shell(
            self.serial(),
            &format!("input swipe {} {} {} {} {}", x1, y1, x2, y2, GESTURE_MS),
        )
        .await?;
        Ok(())
    }

    async fn global_back(&self) -> Result<()> {
        adb::shell(self.serial(), "input keyevent 4").await?; // KEYCODE_BACK
        Ok(())
    }
}
