pub mod json;
pub mod junit;
pub mod sink;
pub mod text;
pub mod types;

pub use sink::{ChannelSink, FileSink, MemorySink, ResultSink, SinkMessage};
pub use types::{CommandRecord, RecordDetails, RecordSummary, StepSummary, Summary, UseCaseReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Read a JSON-lines results file
pub fn read_records(results_path: &Path) -> Result<Vec<RecordSummary>> {
    let content = std::fs::read_to_string(results_path)
        .with_context(|| format!("Failed to read results: {}", results_path.display()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid record on line {}", i + 1))
        })
        .collect()
}

/// Generate report from a results file
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let records = read_records(results_path)?;
    let name = results_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "results".to_string());
    let report = UseCaseReport::from_records(&name, &records);

    match format {
        "json" => json::generate(&report, output),
        "junit" => match output {
            Some(path) => junit::write_report(std::slice::from_ref(&report), path),
            None => {
                println!("{}", junit::generate_junit_xml(std::slice::from_ref(&report))?);
                Ok(())
            }
        },
        "text" => {
            let rendered = text::render(&report);
            match output {
                Some(path) => std::fs::write(path, rendered)
                    .with_context(|| format!("Failed to write {}", path.display())),
                None => {
                    print!("{}", rendered);
                    Ok(())
                }
            }
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}
