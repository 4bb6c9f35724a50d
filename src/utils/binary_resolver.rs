use anyhow::Result;
use std::path::PathBuf;

fn platform_tool(dir: PathBuf, name: &str) -> PathBuf {
    if cfg!(windows) {
        dir.join("platform-tools").join(format!("{}.exe", name))
    } else {
        dir.join("platform-tools").join(name)
    }
}

/// Locate a binary: SDK env vars, then `~/.lumi-a11y`, then the system PATH
pub fn find_binary(name: &str) -> Result<PathBuf> {
    let mut checked_paths = Vec::new();

    for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
        if let Ok(sdk) = std::env::var(var) {
            let path = platform_tool(PathBuf::from(sdk), name);
            checked_paths.push(format!("{}: {:?}", var, path));
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        let path = platform_tool(home.join(".lumi-a11y"), name);
        checked_paths.push(format!("Install Dir: {:?}", path));
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(path) = which::which(name) {
        return Ok(path);
    }

    Err(anyhow::anyhow!(
        "Could not find binary '{}'. Checked paths:\n{}",
        name,
        checked_paths.join("\n")
    ))
}

pub fn find_adb() -> Result<PathBuf> {
    find_binary("adb")
}
