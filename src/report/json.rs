use super::types::UseCaseReport;
use anyhow::Result;
use std::path::Path;

/// Generate JSON report
pub fn generate(report: &UseCaseReport, output: Option<&Path>) -> Result<()> {
    #[derive(serde::Serialize)]
    struct Document<'a> {
        #[serde(flatten)]
        report: &'a UseCaseReport,
        summary: super::types::Summary,
    }

    let json = serde_json::to_string_pretty(&Document {
        report,
        summary: report.summary(),
    })?;

    if let Some(path) = output {
        std::fs::write(path, json)?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}
