pub mod context;
pub mod controller;
pub mod events;
pub mod executor;
pub mod info;
pub mod step;

pub use context::ExecutionContext;
pub use controller::Controller;
pub use events::{ConsoleEventListener, EngineEvent, EventEmitter};
pub use executor::{ExecutorMode, TickOutcome, UseCaseExecutor};
pub use step::{DirectStep, ScreenReaderStep, StepExecutor, StepStrategy};

use crate::parser::load_use_case;
use crate::report::UseCaseReport;
use anyhow::Result;
use colored::Colorize;
use log::warn;
use std::path::PathBuf;

/// Run script files one after another on one executor enable period.
///
/// Stops early, returning the reports gathered so far, once the executor is disabled.
pub async fn run_use_cases(
    files: &[PathBuf],
    executor: &UseCaseExecutor,
    id: u64,
) -> Result<Vec<UseCaseReport>> {
    let mut reports = Vec::new();

    for file in files {
        let use_case = load_use_case(file)?;
        println!(
            "{} {} ({})",
            "▶".green().bold(),
            use_case.name(),
            file.display()
        );
        executor.init(use_case).await;

        match executor.run_to_completion(id).await {
            Some(TickOutcome::Finished(report)) => reports.push(report),
            _ => {
                warn!("Executor stopped before {} finished", file.display());
                break;
            }
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ReplayDriver;
    use crate::report::MemorySink;
    use crate::utils::Config;
    use std::sync::Arc;

    const SCREEN: &str = r#"<hierarchy>
  <node class="Frame" bounds="[0,0][100,100]">
    <node class="Button" text="OK" clickable="true" bounds="[0,0][100,50]"/>
  </node>
</hierarchy>"#;

    #[tokio::test(start_paused = true)]
    async fn test_run_scripts_in_order() {
        let dir = std::env::temp_dir().join(format!("lumi-a11y-run-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let first = dir.join("a.yaml");
        let second = dir.join("b.json");
        std::fs::write(
            &first,
            "name: press ok\ncommands:\n  - action: click\n    target: { text: OK, located_by: text }\n",
        )
        .unwrap();
        std::fs::write(&second, r#"[{"action":"next"},{"action":"select"}]"#).unwrap();

        let driver = Arc::new(ReplayDriver::from_xml(SCREEN).unwrap());
        let sink = Arc::new(MemorySink::new());
        let ctx = Arc::new(ExecutionContext::new(Config::default(), driver, sink.clone()));
        let executor = UseCaseExecutor::new(ctx);
        let id = executor.enable();

        let reports = run_use_cases(&[first, second], &executor, id).await.unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["press ok", "b"]);
        assert!(reports.iter().all(UseCaseReport::is_success));
        assert_eq!(sink.records().len(), 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
