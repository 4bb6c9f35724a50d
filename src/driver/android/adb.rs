use crate::utils::binary_resolver;
use anyhow::{Context, Result};
use log::debug;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Represents an Android device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub serial: String,
    pub state: String,
}

async fn run(serial: Option<&str>, args: &[&str]) -> Result<Output> {
    let mut full_args = Vec::new();
    if let Some(s) = serial {
        full_args.push("-s");
        full_args.push(s);
    }
    full_args.extend_from_slice(args);

    let adb_path = binary_resolver::find_adb()?;
    debug!("adb {}", full_args.join(" "));
    Command::new(adb_path)
        .args(&full_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("Failed to execute: adb {}", full_args.join(" ")))
}

/// Parse the output of `adb devices`
pub fn parse_devices(stdout: &str) -> Vec<Device> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some(Device {
                serial: serial.to_string(),
                state: state.to_string(),
            })
        })
        .collect()
}

/// Get list of connected Android devices
pub async fn get_devices() -> Result<Vec<Device>> {
    let output = run(None, &["devices"]).await?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        debug!("adb devices stderr: {}", stderr.trim());
    }
    Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
}

/// Execute an ADB shell command
pub async fn shell(serial: Option<&str>, cmd: &str) -> Result<String> {
    let output = run(serial, &["shell", cmd]).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ADB shell command failed: {}", stderr);
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Execute ADB exec-out command, streaming the result straight to stdout
pub async fn exec_out(serial: Option<&str>, cmd: &str) -> Result<String> {
    let output = run(serial, &["exec-out", cmd]).await?;
    // exec-out may not set exit status properly, check if we got output
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if stdout.is_empty() && !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ADB exec-out command failed: {}", stderr);
    }
    Ok(stdout)
}

/// Parse `wm size` output, preferring an override size over the physical one
pub fn parse_screen_size(output: &str) -> Option<(u32, u32)> {
    let mut size = None;
    for line in output.lines() {
        let is_override = line.contains("Override size:");
        if !is_override && !line.contains("Physical size:") {
            continue;
        }
        let parsed = line
            .split(':')
            .nth(1)
            .and_then(|s| s.trim().split_once('x'))
            .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
        if parsed.is_some() {
            size = parsed;
            if is_override {
                break;
            }
        }
    }
    size
}

/// Get screen resolution (handles rotation)
pub async fn get_screen_size(serial: Option<&str>) -> Result<(u32, u32)> {
    let output = shell(serial, "wm size").await?;
    let (width, height) = parse_screen_size(&output).unwrap_or((1080, 1920));

    // mRotation=1 (90°) or mRotation=3 (270°) means landscape
    let rotation_output = shell(serial, "dumpsys window displays | grep mRotation")
        .await
        .unwrap_or_default();
    let is_landscape =
        rotation_output.contains("mRotation=1") || rotation_output.contains("mRotation=3");

    if is_landscape && height > width {
        Ok((height, width))
    } else {
        Ok((width, height))
    }
}
