use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};

use crate::runner::{RunResult, StepOutcome, StepResult};

pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// 打印整个 Run：逐 Step 行 + 摘要
    pub fn print_run(&self, run: &RunResult) {
        println!(
            "\nCollection {} ({} steps)\n",
            run.collection.bold(),
            run.totals.total
        );

        for step in &run.steps {
            self.print_step(step);
        }

        self.print_summary(run);
    }

    fn print_step(&self, result: &StepResult) {
        // 跳过的 Step
        if result.outcome == StepOutcome::Skipped {
            println!(
                " {} [{}] {} {}",
                "⊘".dimmed(),
                result.step_number,
                result.name,
                "(skipped)".dimmed()
            );
            return;
        }

        let passed = result.outcome == StepOutcome::Passed;
        let symbol = if passed { "✓".green() } else { "✗".red() };

        let request_part = result
            .request
            .as_ref()
            .map(|r| format!(" {} {}", r.method.to_string().cyan(), r.url))
            .unwrap_or_default();

        println!(
            " {} [{}] {}{} ({}ms)",
            symbol, result.step_number, result.name, request_part, result.latency_ms()
        );

        // 构建或传输错误
        if let Some(error) = &result.error {
            println!("   {}: {}", "Error".red().bold(), error);
        }

        // 失败或 verbose 时显示状态行
        if let Some(response) = &result.response {
            if self.verbose || !passed {
                let status = response.status();
                let status_line = format!("   HTTP {} {}", status.code(), status.reason_phrase());
                if status.is_success() {
                    println!("{}", status_line.green());
                } else if status.is_client_error() {
                    println!("{}", status_line.yellow());
                } else {
                    println!("{}", status_line.red());
                }
            }
        }

        // 断言结果：失败的总是显示，verbose 下全部显示
        for assertion in &result.assertions {
            if assertion.passed && !self.verbose {
                continue;
            }
            if assertion.passed {
                println!(
                    "     {} {} {}",
                    "✓".green(),
                    assertion.target,
                    assertion.comparator
                );
            } else {
                println!(
                    "     {} {} {}",
                    "✗".red(),
                    assertion.target,
                    assertion.comparator
                );
                if let Some(message) = &assertion.message {
                    println!("       {}", message.red());
                }
            }
        }

        for failure in &result.extraction_failures {
            println!("     {} {}", "✗".red(), failure.red());
        }
    }

    /// 打印摘要表
    fn print_summary(&self, run: &RunResult) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Steps", "Passed", "Failed", "Skipped", "Duration"]);

        let failed_color = if run.totals.failed > 0 {
            Color::Red
        } else {
            Color::Green
        };

        table.add_row(vec![
            Cell::new(run.totals.total),
            Cell::new(run.totals.passed).fg(Color::Green),
            Cell::new(run.totals.failed).fg(failed_color),
            Cell::new(run.totals.skipped),
            Cell::new(format!("{:.3}s", run.duration_ms as f64 / 1000.0)),
        ]);

        println!("\n{}", table);

        if run.all_passed() {
            println!("{}\n", "All steps passed".green().bold());
        } else {
            println!(
                "{}\n",
                format!("{} step(s) failed", run.totals.failed).red().bold()
            );
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(false)
    }
}
