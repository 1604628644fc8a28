use crate::runner::{RunResult, StepOutcome, StepResult};

/// 渲染人类可读的 Markdown 报告
///
/// 汇总计数、每个 Step 的延迟、全部失败消息。
pub fn render(run: &RunResult) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# Test report: {}\n\n", run.collection));
    doc.push_str(&format!("- Run ID: `{}`\n", run.run_id));
    doc.push_str(&format!(
        "- Started: {}\n",
        run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    doc.push_str(&format!("- Duration: {} ms\n\n", run.duration_ms));

    doc.push_str("## Summary\n\n");
    doc.push_str(&format!(
        "{} passed, {} failed, {} skipped, {} total\n\n",
        run.totals.passed, run.totals.failed, run.totals.skipped, run.totals.total
    ));

    doc.push_str("## Steps\n\n");
    doc.push_str("| # | Step | Outcome | Status | Latency |\n");
    doc.push_str("|---|------|---------|--------|---------|\n");
    for step in &run.steps {
        doc.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            step.step_number,
            step.name,
            outcome_label(step.outcome),
            step.response
                .as_ref()
                .map(|r| r.status.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if step.outcome == StepOutcome::Skipped {
                "-".to_string()
            } else {
                format!("{} ms", step.latency_ms())
            },
        ));
    }
    doc.push('\n');

    let failed: Vec<&StepResult> = run.steps.iter().filter(|s| s.is_failed()).collect();
    if !failed.is_empty() {
        doc.push_str("## Failures\n\n");
        for step in failed {
            doc.push_str(&format!("### [{}] {}\n\n", step.step_number, step.name));

            if let Some(error) = &step.error {
                doc.push_str(&format!("- Error: {}\n", error));
            }
            for assertion in step.assertions.iter().filter(|a| !a.passed) {
                if let Some(message) = &assertion.message {
                    doc.push_str(&format!("- Assertion: {}\n", message));
                }
            }
            for failure in &step.extraction_failures {
                doc.push_str(&format!("- {}\n", failure));
            }
            doc.push('\n');
        }
    }

    doc
}

fn outcome_label(outcome: StepOutcome) -> &'static str {
    match outcome {
        StepOutcome::Passed => "passed",
        StepOutcome::Failed => "failed",
        StepOutcome::Skipped => "skipped",
    }
}
