use super::types::{StepSummary, UseCaseReport};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Generate a JUnit XML document: one suite per use case, one case per step
pub fn generate_junit_xml(reports: &[UseCaseReport]) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests: usize = reports.iter().map(|r| r.steps.len()).sum();
    let failures: usize = reports
        .iter()
        .flat_map(|r| &r.steps)
        .filter(|s| !s.state.is_success())
        .count();
    let total_duration: u64 = reports.iter().map(|r| r.total_time_ms).sum();
    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "lumi-a11y-run"));
    suites_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(total_duration).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    for report in reports {
        let summary = report.summary();
        let suite_failures = summary.steps - summary.completed;

        let mut suite_start = BytesStart::new("testsuite");
        suite_start.push_attribute(("name", report.name.as_str()));
        suite_start.push_attribute(("tests", summary.steps.to_string().as_str()));
        suite_start.push_attribute(("failures", suite_failures.to_string().as_str()));
        suite_start.push_attribute(("time", seconds(report.total_time_ms).as_str()));
        suite_start.push_attribute(("timestamp", timestamp.as_str()));
        writer.write_event(Event::Start(suite_start))?;

        for step in &report.steps {
            write_test_case(&mut writer, &report.name, step)?;
        }

        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &str,
    step: &StepSummary,
) -> Result<()> {
    let name = format!("Step[{}] {}", step.index, step.kind);
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", name.as_str()));
    case_start.push_attribute(("classname", suite));
    case_start.push_attribute(("time", seconds(step.duration_ms).as_str()));
    writer.write_event(Event::Start(case_start))?;

    if !step.state.is_success() {
        let message = step
            .error
            .clone()
            .unwrap_or_else(|| step.state.to_string());
        let mut fail_start = BytesStart::new("failure");
        fail_start.push_attribute(("message", message.as_str()));
        fail_start.push_attribute(("type", step.state.name()));
        writer.write_event(Event::Start(fail_start))?;
        writer.write_event(Event::Text(BytesText::new(&message)))?;
        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(reports: &[UseCaseReport], path: &Path) -> Result<()> {
    let xml = generate_junit_xml(reports)?;
    std::fs::write(path, xml)?;
    log::info!("Generated JUnit report: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandStatus;

    fn step(index: usize, state: CommandStatus, error: Option<&str>) -> StepSummary {
        StepSummary {
            index,
            kind: "click".to_string(),
            state,
            events: 1,
            duration_ms: 500,
            acting_widget: None,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_generate_junit_xml() {
        let reports = vec![UseCaseReport {
            name: "Login".to_string(),
            steps: vec![
                step(0, CommandStatus::Completed, None),
                step(1, CommandStatus::CompletedByHelp, None),
                step(2, CommandStatus::FailedLocate, Some("gave up after 4 locating attempts")),
            ],
            total_time_ms: 1500,
        }];

        let xml = generate_junit_xml(&reports).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="lumi-a11y-run""#));
        assert!(xml.contains(r#"tests="3""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"<testcase name="Step[2] click" classname="Login""#));
        assert!(xml.contains(r#"type="FAILED_LOCATE""#));
        assert!(xml.contains(r#"message="gave up after 4 locating attempts""#));
    }
}
