use super::types::{CommandInput, ScriptFile};
use crate::command::UseCase;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const SCRIPT_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Parse script content (JSON is read as YAML) into a use case
pub fn parse_script(content: &str, default_name: &str) -> Result<UseCase> {
    let script: ScriptFile =
        serde_yaml::from_str(content).context("Failed to parse use-case script")?;
    let (name, inputs) = match script {
        ScriptFile::Commands(commands) => (None, commands),
        ScriptFile::Named { name, commands } => (name, commands),
    };

    let commands = inputs
        .into_iter()
        .enumerate()
        .map(|(index, input): (usize, CommandInput)| {
            let action = input.action.clone();
            input
                .into_command()
                .with_context(|| format!("Command {} ({}) is invalid", index + 1, action))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(UseCase::new(
        name.unwrap_or_else(|| default_name.to_string()),
        commands,
    ))
}

/// Load a use case from a script file; the file stem names it unless the script does
pub fn load_use_case(path: &Path) -> Result<UseCase> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "use-case".to_string());
    parse_script(&content, &stem).with_context(|| format!("In {}", path.display()))
}

/// Collect script files under `path` (or `path` itself), sorted for a stable run order
pub fn discover_scripts(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path not found: {}", path.display());
    }
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_script(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Action;

    #[test]
    fn test_parse_bare_json_list() {
        let use_case = parse_script(
            r#"[{"action":"next"},{"action":"sleep","sleep":"1"}]"#,
            "login",
        )
        .unwrap();
        assert_eq!(use_case.name(), "login");
        assert_eq!(use_case.len(), 2);
        assert_eq!(use_case.commands()[1].action(), &Action::Sleep(1));
    }

    #[test]
    fn test_parse_named_yaml() {
        let use_case = parse_script(
            r#"
name: checkout
commands:
  - action: click
    target:
      text: Pay
      located_by: text
  - action: back
"#,
            "ignored",
        )
        .unwrap();
        assert_eq!(use_case.name(), "checkout");
        assert_eq!(use_case.len(), 2);
    }

    #[test]
    fn test_invalid_command_names_its_position() {
        let err = parse_script(r#"[{"action":"next"},{"action":"warp"}]"#, "x").unwrap_err();
        assert!(format!("{:#}", err).contains("Command 2 (warp)"));
    }

    #[test]
    fn test_discover_scripts_filters_extensions() {
        let dir = std::env::temp_dir().join(format!("lumi-a11y-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("b.yaml"), "[]").unwrap();
        std::fs::write(dir.join("nested/a.json"), "[]").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();

        let files = discover_scripts(&dir).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| is_script(f)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
