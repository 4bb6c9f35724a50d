//! Plain-text aggregate report, one `$`-separated line per step plus a summary line.

use super::types::{StepSummary, Summary, UseCaseReport};

pub fn format_step(step: &StepSummary) -> String {
    format!(
        "Step[{}] $ State: {} $ #Events: {} $ Time: {} $ ActingWidget: {}",
        step.index,
        step.state,
        step.events,
        step.duration_ms,
        step.acting_widget.as_deref().unwrap_or("-")
    )
}

pub fn format_summary(summary: &Summary) -> String {
    format!(
        "Steps: {} $ Completed: {} $ Failed: {} $ Unlocatable: {} $ FirstProblem: {} $ TotalEvents: {} $ TotalTime: {}",
        summary.steps,
        summary.completed,
        summary.failed,
        summary.unlocatable,
        summary.first_problem,
        summary.total_events,
        summary.total_time_ms
    )
}

pub fn render(report: &UseCaseReport) -> String {
    let mut out = String::new();
    for step in &report.steps {
        out.push_str(&format_step(step));
        out.push('\n');
    }
    out.push_str(&format_summary(&report.summary()));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandStatus;

    #[test]
    fn test_render() {
        let report = UseCaseReport {
            name: "demo".into(),
            steps: vec![
                StepSummary {
                    index: 0,
                    kind: "click".into(),
                    state: CommandStatus::Completed,
                    events: 1,
                    duration_ms: 40,
                    acting_widget: Some("class=Button text=\"OK\"".into()),
                    error: None,
                },
                StepSummary {
                    index: 1,
                    kind: "click".into(),
                    state: CommandStatus::FailedLocate,
                    events: 4,
                    duration_ms: 1500,
                    acting_widget: None,
                    error: Some("gave up".into()),
                },
            ],
            total_time_ms: 1600,
        };

        let text = render(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Step[0] $ State: COMPLETED $ #Events: 1 $ Time: 40 $ ActingWidget: class=Button text=\"OK\""
        );
        assert_eq!(
            lines[1],
            "Step[1] $ State: FAILED_LOCATE $ #Events: 4 $ Time: 1500 $ ActingWidget: -"
        );
        assert_eq!(
            lines[2],
            "Steps: 2 $ Completed: 1 $ Failed: 0 $ Unlocatable: 1 $ FirstProblem: 1 $ TotalEvents: 5 $ TotalTime: 1600"
        );
    }
}
