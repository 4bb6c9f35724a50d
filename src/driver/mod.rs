pub mod android;
pub mod replay;
pub mod traits;
pub mod uiautomator;

pub use replay::{DriverCall, ReplayDriver};
pub use traits::{AccessibilityDriver, NodeAction, SwipeDirection};

use anyhow::Result;

/// Devices that can be driven on `platform`. Replay runs read dumps and have none.
pub async fn list_devices(platform: &str) -> Result<Vec<android::Device>> {
    match platform {
        "android" => android::adb::get_devices().await,
        "replay" => Ok(Vec::new()),
        _ => anyhow::bail!("Unknown platform: {}", platform),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_devices_by_platform() {
        assert!(list_devices("replay").await.unwrap().is_empty());
        assert!(list_devices("ios").await.is_err());
    }
}
